use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use domain::{ChatMessage, RoomName, SessionId};
use tokio::sync::mpsc;

struct RegistryInner {
    /// 房间 → 当前成员的出站通道
    rooms: HashMap<RoomName, HashMap<SessionId, mpsc::UnboundedSender<ChatMessage>>>,
    /// 会话 → 当前房间（反向索引，保证单房间不变量）
    sessions: HashMap<SessionId, RoomName>,
    /// 房间级发送排序锁，append + 扇出在它下面串行
    send_locks: HashMap<RoomName, Arc<tokio::sync::Mutex<()>>>,
}

/// 房间注册表：房间名 → 当前连接会话集合。
///
/// 纯瞬态结构，进程重启后从零重建。所有成员变更和扇出遍历
/// 都在同一把锁下进行：扇出不会漏掉并发 join 的会话，也不会
/// 在会话移除生效之后再投递消息。
pub struct RoomRegistry {
    inner: Mutex<RegistryInner>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                rooms: HashMap::new(),
                sessions: HashMap::new(),
                send_locks: HashMap::new(),
            }),
        }
    }

    /// 把会话加入房间。
    ///
    /// 如果会话已属于别的房间，在同一次锁内先移除再加入，
    /// 不存在同时属于两个房间的窗口。
    pub fn join(
        &self,
        session_id: SessionId,
        room: RoomName,
        outbox: mpsc::UnboundedSender<ChatMessage>,
    ) {
        let mut inner = self.inner.lock().expect("room registry lock poisoned");

        if let Some(previous) = inner.sessions.remove(&session_id) {
            if previous == room {
                inner.sessions.insert(session_id, previous);
                return; // 重复 join 同一房间是无操作
            }
            Self::remove_member(&mut inner, &previous, session_id);
        }

        inner
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(session_id, outbox);
        inner.sessions.insert(session_id, room);
    }

    /// 把会话从当前房间移除（disconnect 路径）。幂等。
    pub fn leave(&self, session_id: SessionId) -> Option<RoomName> {
        let mut inner = self.inner.lock().expect("room registry lock poisoned");
        let room = inner.sessions.remove(&session_id)?;
        Self::remove_member(&mut inner, &room, session_id);
        Some(room)
    }

    /// 房间的发送排序锁。持有它期间，同房间不会有第二条消息
    /// 进入 append + 扇出的临界区。
    pub fn send_lock(&self, room: &RoomName) -> Arc<tokio::sync::Mutex<()>> {
        let mut inner = self.inner.lock().expect("room registry lock poisoned");
        inner
            .send_locks
            .entry(room.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// 把一条已持久化的消息投递给房间的全部当前成员（含发送者）。
    ///
    /// 通道已断开的成员直接跳过；它仍然算作成员，直到它自己的
    /// disconnect 把它移除。
    pub fn fan_out(&self, room: &RoomName, message: &ChatMessage) {
        let inner = self.inner.lock().expect("room registry lock poisoned");
        let Some(members) = inner.rooms.get(room) else {
            return;
        };

        for (session_id, outbox) in members {
            if outbox.send(message.clone()).is_err() {
                tracing::debug!(
                    room = %room,
                    session_id = %session_id,
                    "成员出站通道已关闭，等待 disconnect 清理"
                );
            }
        }
    }

    /// 房间当前成员数（空房间返回 0）。
    pub fn member_count(&self, room: &RoomName) -> usize {
        let inner = self.inner.lock().expect("room registry lock poisoned");
        inner.rooms.get(room).map_or(0, HashMap::len)
    }

    /// 会话当前所在的房间。
    pub fn room_of(&self, session_id: SessionId) -> Option<RoomName> {
        let inner = self.inner.lock().expect("room registry lock poisoned");
        inner.sessions.get(&session_id).cloned()
    }

    fn remove_member(inner: &mut RegistryInner, room: &RoomName, session_id: SessionId) {
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(&session_id);
            if members.is_empty() {
                // 房间随最后一个成员一起消失，注册表不会无限增长
                inner.rooms.remove(room);
                inner.send_locks.remove(room);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> RoomName {
        RoomName::parse(name).unwrap()
    }

    #[test]
    fn join_moves_session_between_rooms() {
        let registry = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = SessionId::generate();

        registry.join(session, room("General"), tx.clone());
        assert_eq!(registry.member_count(&room("General")), 1);

        registry.join(session, room("DevOps"), tx);
        assert_eq!(registry.member_count(&room("General")), 0);
        assert_eq!(registry.member_count(&room("DevOps")), 1);
        assert_eq!(registry.room_of(session), Some(room("DevOps")));
    }

    #[test]
    fn leave_is_idempotent_and_prunes_empty_rooms() {
        let registry = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = SessionId::generate();

        registry.join(session, room("General"), tx);
        assert_eq!(registry.leave(session), Some(room("General")));
        assert_eq!(registry.leave(session), None);
        assert_eq!(registry.member_count(&room("General")), 0);
    }

    #[test]
    fn fan_out_skips_rooms_without_members() {
        let registry = RoomRegistry::new();
        let author = domain::Identity::new(uuid::Uuid::new_v4(), "tester", None);
        let message = ChatMessage::draft(
            room("Empty"),
            domain::MessageText::parse("hello").unwrap(),
            &author,
            time::OffsetDateTime::now_utc(),
        );

        // 没有成员时扇出是无操作，不 panic
        registry.fan_out(&room("Empty"), &message);
    }
}

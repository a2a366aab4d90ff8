use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use domain::{ChatMessage, RoomName};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl StoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 消息存储：房间维度的追加日志。
///
/// 核心不暴露任何更新或删除操作。
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 追加消息并原子分配房间内单调递增的 `sequence_id`。
    ///
    /// 同一房间的两次并发 append 绝不会拿到相同的序列号。
    async fn append(&self, message: ChatMessage) -> Result<ChatMessage, StoreError>;

    /// 返回房间最近 `limit` 条消息，按 `(sent_at, sequence_id)` 旧到新。
    async fn query_recent(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError>;
}

#[derive(Debug, Default)]
struct RoomLog {
    next_sequence: u64,
    messages: Vec<ChatMessage>,
}

/// 内存实现的消息存储（用于测试和本地开发）。
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    rooms: Mutex<HashMap<RoomName, RoomLog>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, mut message: ChatMessage) -> Result<ChatMessage, StoreError> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| StoreError::storage("message store lock poisoned"))?;
        let log = rooms.entry(message.room.clone()).or_default();

        log.next_sequence += 1;
        message.sequence_id = log.next_sequence;
        log.messages.push(message.clone());

        Ok(message)
    }

    async fn query_recent(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rooms = self
            .rooms
            .lock()
            .map_err(|_| StoreError::storage("message store lock poisoned"))?;

        let Some(log) = rooms.get(room) else {
            return Ok(Vec::new());
        };

        let skip = log.messages.len().saturating_sub(limit as usize);
        Ok(log.messages[skip..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Identity, MessageText};
    use uuid::Uuid;

    fn draft(room: &str, text: &str) -> ChatMessage {
        let author = Identity::new(Uuid::new_v4(), "tester", None);
        ChatMessage::draft(
            RoomName::parse(room).unwrap(),
            MessageText::parse(text).unwrap(),
            &author,
            time::OffsetDateTime::now_utc(),
        )
    }

    #[tokio::test]
    async fn append_assigns_monotonic_sequence_per_room() {
        let store = MemoryMessageStore::new();

        let a = store.append(draft("General", "a")).await.unwrap();
        let b = store.append(draft("General", "b")).await.unwrap();
        let other = store.append(draft("DevOps", "c")).await.unwrap();

        assert_eq!(a.sequence_id, 1);
        assert_eq!(b.sequence_id, 2);
        assert_eq!(other.sequence_id, 1); // 序列号按房间独立
    }

    #[tokio::test]
    async fn query_recent_returns_tail_oldest_first() {
        let store = MemoryMessageStore::new();
        for i in 0..5 {
            store
                .append(draft("General", &format!("m{}", i)))
                .await
                .unwrap();
        }

        let tail = store
            .query_recent(&RoomName::parse("General").unwrap(), 3)
            .await
            .unwrap();

        let sequences: Vec<u64> = tail.iter().map(|m| m.sequence_id).collect();
        assert_eq!(sequences, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn query_recent_on_unknown_room_is_empty() {
        let store = MemoryMessageStore::new();
        let messages = store
            .query_recent(&RoomName::parse("Nowhere").unwrap(), 10)
            .await
            .unwrap();
        assert!(messages.is_empty());
    }
}

use std::sync::Arc;

use domain::{ChatError, ChatMessage, Identity, MessageText, RoomName};
use tokio::sync::mpsc;

use crate::{
    clock::Clock,
    registry::RoomRegistry,
    session::{Session, SessionState},
    store::MessageStore,
    verifier::IdentityVerifier,
};

pub struct DispatcherDependencies {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn MessageStore>,
    pub clock: Arc<dyn Clock>,
}

/// 聊天协议状态机。
///
/// 接收会话的入站事件（bind、join、send、disconnect），变更房间
/// 注册表，持久化出站消息，并扇出给目标房间的所有会话。
///
/// 不变量：
/// - 持久化先于广播：消息没写进存储就绝不会被广播，哪怕存储
///   失败也不降级；
/// - 同一房间被接受的消息，持久化完成的顺序就是所有成员观察
///   到的顺序；
/// - 任何单个会话的错误都是本地的，不影响其它会话。
pub struct Dispatcher {
    deps: DispatcherDependencies,
    registry: RoomRegistry,
}

impl Dispatcher {
    pub fn new(deps: DispatcherDependencies) -> Self {
        Self {
            deps,
            registry: RoomRegistry::new(),
        }
    }

    /// 传输层 connect 后开启一个会话。
    ///
    /// 返回的接收端是该连接的出站消息流；接收方无消息可投递时
    /// 自然挂起在 `recv` 上。
    pub fn open_session(&self) -> (Session, mpsc::UnboundedReceiver<ChatMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(tx);
        tracing::debug!(session_id = %session.id(), "会话已创建");
        (session, rx)
    }

    /// 绑定身份，每条连接在 connect 之后立即调用一次。
    ///
    /// 验证失败时会话直接进入 `Closed`，连接应当被拆除；绑定
    /// 成功前不接受任何消息流量。
    pub async fn bind(
        &self,
        session: &mut Session,
        credential: &str,
    ) -> Result<Identity, ChatError> {
        match session.state() {
            SessionState::Unbound => {}
            SessionState::Closed => return Err(ChatError::SessionClosed),
            // bind 只应被调用一次；重复 bind 返回既有身份
            SessionState::Bound { identity } | SessionState::InRoom { identity, .. } => {
                return Ok(identity.clone());
            }
        }

        match self.deps.verifier.verify(credential).await {
            Ok(identity) => {
                tracing::info!(
                    session_id = %session.id(),
                    user_id = %identity.id,
                    "身份绑定成功"
                );
                session.set_state(SessionState::Bound {
                    identity: identity.clone(),
                });
                Ok(identity)
            }
            Err(_) => {
                tracing::warn!(session_id = %session.id(), "身份验证失败，关闭会话");
                session.set_state(SessionState::Closed);
                Err(ChatError::IdentityInvalid)
            }
        }
    }

    /// 加入房间。
    ///
    /// 会话若已在别的房间，先原子地离开旧房间；join 对其它成员
    /// 静默，不广播任何 presence 事件。
    pub fn join(&self, session: &mut Session, room: &str) -> Result<RoomName, ChatError> {
        let identity = match session.state() {
            SessionState::Bound { identity } | SessionState::InRoom { identity, .. } => {
                identity.clone()
            }
            SessionState::Unbound => return Err(ChatError::NotBound),
            SessionState::Closed => return Err(ChatError::SessionClosed),
        };

        let room = RoomName::parse(room)?;
        self.registry.join(session.id(), room.clone(), session.outbox());
        tracing::info!(session_id = %session.id(), room = %room, "会话加入房间");

        session.set_state(SessionState::InRoom {
            identity,
            room: room.clone(),
        });
        Ok(room)
    }

    /// 发送消息。
    ///
    /// 接受后由 Dispatcher 赋 `sent_at`，存储赋 `sequence_id`，
    /// 持久化成功才扇出给房间全部当前成员——包括发送者自己，
    /// 发送者不做本地回显，靠收到自己的广播保证全序一致。
    pub async fn send(&self, session: &Session, text: &str) -> Result<ChatMessage, ChatError> {
        let (identity, room) = match session.state() {
            SessionState::InRoom { identity, room } => (identity, room.clone()),
            SessionState::Bound { .. } => return Err(ChatError::NotInRoom),
            SessionState::Unbound => return Err(ChatError::NotBound),
            SessionState::Closed => return Err(ChatError::SessionClosed),
        };

        let text = MessageText::parse(text)?;

        // 同一房间的 append + 扇出在排序锁下串行，持久化顺序
        // 就是广播顺序
        let ordering = self.registry.send_lock(&room);
        let _ordering = ordering.lock().await;

        let draft = ChatMessage::draft(room.clone(), text, identity, self.deps.clock.now());
        let stored = self.deps.store.append(draft).await.map_err(|err| {
            tracing::error!(
                session_id = %session.id(),
                room = %room,
                error = %err,
                "消息持久化失败，拒绝发送且不广播"
            );
            ChatError::store_unavailable(err.to_string())
        })?;

        self.registry.fan_out(&room, &stored);
        Ok(stored)
    }

    /// 断开会话：移出房间注册表并进入终态。幂等，第二次调用
    /// 是无操作。
    pub fn disconnect(&self, session: &mut Session) {
        if session.is_closed() {
            return;
        }

        if let Some(room) = self.registry.leave(session.id()) {
            tracing::info!(session_id = %session.id(), room = %room, "会话离开房间");
        }
        session.set_state(SessionState::Closed);
        tracing::debug!(session_id = %session.id(), "会话已关闭");
    }

    /// 注册表只通过 Dispatcher 的入口变更；这里暴露只读视图
    /// 给测试和诊断。
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }
}

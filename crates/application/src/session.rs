use domain::{ChatMessage, Identity, RoomName, SessionId};
use tokio::sync::mpsc;

/// 会话协议状态机。
///
/// `Unbound → Bound → InRoom(r)`，re-join 停留在 `InRoom`，
/// disconnect 进入终态 `Closed`，此后不再接受任何事件。
#[derive(Debug, Clone)]
pub enum SessionState {
    Unbound,
    Bound { identity: Identity },
    InRoom { identity: Identity, room: RoomName },
    Closed,
}

/// 一条活跃连接在服务端的状态。
///
/// 身份在凭证握手后绑定一次，此后不可变；`room` 在首次 join
/// 前为空。出站消息通过 `outbox` 走向传输层。
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    outbox: mpsc::UnboundedSender<ChatMessage>,
}

impl Session {
    pub(crate) fn new(outbox: mpsc::UnboundedSender<ChatMessage>) -> Self {
        Self {
            id: SessionId::generate(),
            state: SessionState::Unbound,
            outbox,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn outbox(&self) -> mpsc::UnboundedSender<ChatMessage> {
        self.outbox.clone()
    }

    /// 绑定后的身份；`Unbound` 和 `Closed` 返回 None。
    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Bound { identity } | SessionState::InRoom { identity, .. } => {
                Some(identity)
            }
            SessionState::Unbound | SessionState::Closed => None,
        }
    }

    /// 当前所在房间；未 join 或已关闭返回 None。
    pub fn room(&self) -> Option<&RoomName> {
        match &self.state {
            SessionState::InRoom { room, .. } => Some(room),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }
}

//! 聊天核心错误定义
//!
//! 四类错误都是会话本地的：一个会话出错不会影响其它会话的
//! 房间成员关系或消息投递。

use thiserror::Error;

/// 聊天核心错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// 身份凭证验证失败，连接直接关闭
    #[error("identity credential is invalid")]
    IdentityInvalid,

    /// 身份还未绑定就发出 join/send 事件
    #[error("session has no bound identity")]
    NotBound,

    /// 未加入房间就发送消息
    #[error("session has not joined a room")]
    NotInRoom,

    /// 空房间名或空白消息内容
    #[error("empty input: {field}")]
    EmptyInput { field: &'static str },

    /// 持久化失败，消息被拒绝且不广播
    #[error("message store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// 会话已关闭，不再接受任何事件
    #[error("session is closed")]
    SessionClosed,
}

impl ChatError {
    pub fn empty_input(field: &'static str) -> Self {
        Self::EmptyInput { field }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }
}

/// 聊天核心结果类型
pub type ChatResult<T> = Result<T, ChatError>;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 身份验证器输出的稳定用户身份。
///
/// 聊天核心在 bind 时消费一次，此后完全信任；显示名和头像
/// 在发送时反规范化进消息，历史回放不需要再解析身份。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, display_name: impl Into<String>, avatar_ref: Option<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_ref,
        }
    }
}

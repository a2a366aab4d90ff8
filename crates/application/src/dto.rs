use domain::{ChatMessage, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息的线上形态，回看端点和 WebSocket 帧共用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub room: String,
    pub text: String,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub author_avatar_ref: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: Timestamp,
    pub sequence_id: u64,
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            room: message.room.as_str().to_owned(),
            text: message.text.as_str().to_owned(),
            author_id: message.author_id,
            author_display_name: message.author_display_name.clone(),
            author_avatar_ref: message.author_avatar_ref.clone(),
            sent_at: message.sent_at,
            sequence_id: message.sequence_id,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::value_objects::{MessageText, RoomName, Timestamp};
use uuid::Uuid;

/// 持久化的聊天消息。
///
/// `sent_at` 由 Dispatcher 在接受消息的那一刻赋值，`sequence_id`
/// 由消息存储在 append 时按房间单调分配。房间内的全序是
/// `(sent_at, sequence_id)`，一经分配永不变更。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room: RoomName,
    pub text: MessageText,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub author_avatar_ref: Option<String>,
    pub sent_at: Timestamp,
    pub sequence_id: u64,
}

impl ChatMessage {
    /// 构造一条尚未分配 `sequence_id` 的消息（存储在 append 时补上）。
    pub fn draft(room: RoomName, text: MessageText, author: &Identity, sent_at: Timestamp) -> Self {
        Self {
            room,
            text,
            author_id: author.id,
            author_display_name: author.display_name.clone(),
            author_avatar_ref: author.avatar_ref.clone(),
            sent_at,
            sequence_id: 0,
        }
    }

    /// 房间内排序键。
    pub fn ordering_key(&self) -> (Timestamp, u64) {
        (self.sent_at, self.sequence_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn draft_denormalizes_author_fields() {
        let author = Identity::new(Uuid::new_v4(), "alice", Some("avatars/alice.png".into()));
        let message = ChatMessage::draft(
            RoomName::parse("General").unwrap(),
            MessageText::parse("hi").unwrap(),
            &author,
            OffsetDateTime::now_utc(),
        );

        assert_eq!(message.author_id, author.id);
        assert_eq!(message.author_display_name, "alice");
        assert_eq!(message.author_avatar_ref.as_deref(), Some("avatars/alice.png"));
        assert_eq!(message.sequence_id, 0);
    }
}

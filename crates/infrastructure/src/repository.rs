use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use application::{MessageStore, StoreError};
use domain::{ChatMessage, MessageText, RoomName};

fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    StoreError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> StoreError {
    StoreError::storage(message)
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    room: String,
    sequence_id: i64,
    text: String,
    author_id: Uuid,
    author_display_name: String,
    author_avatar_ref: Option<String>,
    sent_at: OffsetDateTime,
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = StoreError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let room = RoomName::parse(value.room).map_err(|err| invalid_data(err.to_string()))?;
        let text = MessageText::parse(value.text).map_err(|err| invalid_data(err.to_string()))?;

        Ok(ChatMessage {
            room,
            text,
            author_id: value.author_id,
            author_display_name: value.author_display_name,
            author_avatar_ref: value.author_avatar_ref,
            sent_at: value.sent_at,
            sequence_id: value.sequence_id as u64,
        })
    }
}

/// PostgreSQL 实现的消息存储。
///
/// `sequence_id` 来自每个房间一行的计数器表；计数器在消息插入
/// 同一个事务里递增，行锁保证同房间并发 append 串行取号，两次
/// 并发写不可能拿到相同的序列号。
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, mut message: ChatMessage) -> Result<ChatMessage, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let (sequence_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO chat_sequences (room, value)
            VALUES ($1, 1)
            ON CONFLICT (room) DO UPDATE SET value = chat_sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(message.room.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query(
            r#"
            INSERT INTO chat_messages
                (room, sequence_id, text, author_id, author_display_name, author_avatar_ref, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.room.as_str())
        .bind(sequence_id)
        .bind(message.text.as_str())
        .bind(message.author_id)
        .bind(&message.author_display_name)
        .bind(&message.author_avatar_ref)
        .bind(message.sent_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        message.sequence_id = sequence_id as u64;
        Ok(message)
    }

    async fn query_recent(
        &self,
        room: &RoomName,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        // 先按新到旧取末尾 limit 条，再反转成旧到新
        let mut records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT room, sequence_id, text, author_id, author_display_name, author_avatar_ref, sent_at
            FROM chat_messages
            WHERE room = $1
            ORDER BY sent_at DESC, sequence_id DESC
            LIMIT $2
            "#,
        )
        .bind(room.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.reverse();
        records.into_iter().map(ChatMessage::try_from).collect()
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

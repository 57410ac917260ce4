//! Repository for message data access operations.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};

use crate::entities::{ConversationId, Message, MessageId, Sender, UserId};
use crate::types::{timestamp, StoreError, StoreResult};

/// Page size used when a history request does not specify one.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;
/// Upper bound applied to any history page.
pub const MAX_HISTORY_LIMIT: u32 = 500;

const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, body, is_assistant, created_at";

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a message and return it with its assigned order key.
    ///
    /// The authorship check and the insert are a single statement, so a
    /// sender is a member at the instant the row is written.
    pub async fn append(
        &self,
        conversation_id: &ConversationId,
        sender: &Sender,
        body: &str,
    ) -> StoreResult<Message> {
        let now = timestamp();

        let result = match sender {
            Sender::User(user_id) => {
                sqlx::query(
                    "INSERT INTO messages (conversation_id, sender_id, body, is_assistant, created_at)
                     SELECT ?, ?, ?, 0, ?
                     WHERE EXISTS (
                         SELECT 1 FROM conversation_members WHERE conversation_id = ? AND user_id = ?
                     )",
                )
                .bind(conversation_id.as_str())
                .bind(user_id.as_str())
                .bind(body)
                .bind(&now)
                .bind(conversation_id.as_str())
                .bind(user_id.as_str())
                .execute(&self.pool)
                .await?
            }
            Sender::Assistant => {
                sqlx::query(
                    "INSERT INTO messages (conversation_id, sender_id, body, is_assistant, created_at)
                     SELECT id, NULL, ?, 1, ? FROM conversations WHERE id = ? AND kind = 'assistant'",
                )
                .bind(body)
                .bind(&now)
                .bind(conversation_id.as_str())
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(self.rejection(conversation_id, sender).await);
        }

        let id = MessageId(result.last_insert_rowid());

        info!(
            message_id = %id,
            conversation_id = %conversation_id,
            assistant = sender.is_assistant(),
            "appended message"
        );

        Ok(Message {
            id,
            conversation_id: conversation_id.clone(),
            sender: sender.clone(),
            body: body.to_owned(),
            created_at: now,
        })
    }

    /// Messages after the exclusive `since` cursor, ascending by order key.
    pub async fn history(
        &self,
        conversation_id: &ConversationId,
        since: Option<MessageId>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Message>> {
        let since = since.map(MessageId::value).unwrap_or(0);
        let limit = clamp_limit(limit);

        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = ? AND id > ?
             ORDER BY id ASC LIMIT ?"
        ))
        .bind(conversation_id.as_str())
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(conversation_id = %conversation_id, since, count = rows.len(), "loaded history");
        rows.iter().map(message_from_row).collect()
    }

    /// The last `limit` messages strictly before `before`, ascending.
    pub async fn recent(
        &self,
        conversation_id: &ConversationId,
        before: MessageId,
        limit: u32,
    ) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM (
                 SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ? AND id < ?
                 ORDER BY id DESC LIMIT ?
             ) ORDER BY id ASC"
        ))
        .bind(conversation_id.as_str())
        .bind(before.value())
        .bind(i64::from(limit.min(MAX_HISTORY_LIMIT)))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn rejection(&self, conversation_id: &ConversationId, sender: &Sender) -> StoreError {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM conversations WHERE id = ?)",
        )
        .bind(conversation_id.as_str())
        .fetch_one(&self.pool)
        .await;

        match exists {
            Ok(false) => StoreError::not_found("conversation", conversation_id.as_str()),
            Ok(true) => match sender {
                Sender::User(_) => StoreError::forbidden("sender is not a member of the conversation"),
                Sender::Assistant => {
                    StoreError::forbidden("the assistant only writes to assistant conversations")
                }
            },
            Err(error) => error.into(),
        }
    }
}

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

fn message_from_row(row: &SqliteRow) -> StoreResult<Message> {
    let is_assistant: bool = row.try_get("is_assistant")?;
    let sender_id: Option<String> = row.try_get("sender_id")?;

    let sender = match (is_assistant, sender_id) {
        (true, _) => Sender::Assistant,
        (false, Some(id)) => Sender::User(UserId::new(id)),
        (false, None) => {
            return Err(StoreError::Corrupt(
                "user message without a sender id".to_string(),
            ))
        }
    };

    Ok(Message {
        id: MessageId(row.try_get("id")?),
        conversation_id: ConversationId::new(row.try_get::<String, _>("conversation_id")?),
        sender,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(clamp_limit(None), DEFAULT_HISTORY_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(10_000)), MAX_HISTORY_LIMIT);
    }
}

//! Repository for membership checks.

use sqlx::SqlitePool;

use crate::entities::{ConversationId, UserId};
use crate::types::StoreResult;

/// Strongly consistent membership lookups.
#[derive(Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `false` for non-members and for conversations that do not exist.
    pub async fn is_member(
        &self,
        user_id: &UserId,
        conversation_id: &ConversationId,
    ) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM conversation_members WHERE conversation_id = ? AND user_id = ?)",
        )
        .bind(conversation_id.as_str())
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

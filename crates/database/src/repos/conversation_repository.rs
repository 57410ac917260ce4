//! Repository for conversations and their membership rows.

use std::collections::{HashMap, HashSet};

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};

use crate::entities::{
    direct_key, Conversation, ConversationId, ConversationKind, MessageId, NewConversation,
    UserId, MAX_CONVERSATION_NAME,
};
use crate::repos::UserRepository;
use crate::types::{timestamp, StoreError, StoreResult};

const CONVERSATION_COLUMNS: &str = "c.id, c.kind, c.name, c.created_at,
    (SELECT MAX(m.id) FROM messages m WHERE m.conversation_id = c.id) AS last_message_id,
    COALESCE((SELECT MAX(m.created_at) FROM messages m WHERE m.conversation_id = c.id), c.created_at) AS active_at";

/// Repository for conversation database operations
#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
    users: UserRepository,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let users = UserRepository::new(pool.clone());
        Self { pool, users }
    }

    /// Create a conversation together with its membership rows.
    ///
    /// Member ids are de-duplicated before validation. Direct conversations
    /// are unique per member pair, so asking for an existing pair returns the
    /// stored conversation instead of a new one.
    pub async fn create(&self, request: NewConversation) -> StoreResult<Conversation> {
        let (conversation, _) = self.create_or_reuse(request).await?;
        Ok(conversation)
    }

    /// Like [`create`](Self::create), also reporting whether a new row was
    /// written (`true`) or an existing direct conversation was returned.
    pub async fn create_or_reuse(
        &self,
        request: NewConversation,
    ) -> StoreResult<(Conversation, bool)> {
        let kind = request.kind;
        let members = dedupe(request.member_ids);
        let name = normalise_name(request.name)?;

        let (min, max) = kind.member_bounds();
        if members.len() < min || members.len() > max {
            return Err(StoreError::invalid_argument(match kind {
                ConversationKind::Direct => "direct conversations need exactly two members".to_string(),
                ConversationKind::Group => "group conversations need at least two members".to_string(),
                ConversationKind::Assistant => {
                    "assistant conversations have exactly one user member".to_string()
                }
            }));
        }
        if kind.requires_name() && name.is_none() {
            return Err(StoreError::invalid_argument("group conversations need a name"));
        }

        let missing = self.users.missing(&members).await?;
        if let Some(first) = missing.first() {
            return Err(StoreError::not_found("user", first.as_str()));
        }

        let pair_key = match kind {
            ConversationKind::Direct => Some(direct_key(&members[0], &members[1])),
            _ => None,
        };

        if let Some(key) = pair_key.as_deref() {
            if let Some(existing) = self.find_by_direct_key(key).await? {
                debug!(conversation_id = %existing.id, "reusing direct conversation");
                return Ok((existing, false));
            }
        }

        let id = ConversationId::generate();
        let now = timestamp();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO conversations (id, kind, name, direct_key, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(kind.as_str())
        .bind(name.as_deref())
        .bind(pair_key.as_deref())
        .bind(&now)
        .execute(&mut *tx)
        .await;

        if let Err(error) = inserted {
            let raced = matches!(&error, sqlx::Error::Database(db) if db.is_unique_violation());
            drop(tx);
            if let (true, Some(key)) = (raced, pair_key.as_deref()) {
                let existing = self
                    .find_by_direct_key(key)
                    .await?
                    .ok_or_else(|| StoreError::not_found("conversation", key))?;
                return Ok((existing, false));
            }
            return Err(error.into());
        }

        for member in &members {
            sqlx::query(
                "INSERT INTO conversation_members (conversation_id, user_id, joined_at) VALUES (?, ?, ?)",
            )
            .bind(id.as_str())
            .bind(member.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            conversation_id = %id,
            kind = %kind,
            members = members.len(),
            "created conversation"
        );

        let conversation = Conversation {
            id,
            kind,
            name,
            member_ids: members,
            created_at: now,
            last_message_id: None,
        };
        Ok((conversation, true))
    }

    pub async fn find(&self, id: &ConversationId) -> StoreResult<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut conversation = conversation_from_row(&row)?;
        conversation.member_ids = self.members_of(&conversation.id).await?;
        Ok(Some(conversation))
    }

    pub async fn kind_of(&self, id: &ConversationId) -> StoreResult<Option<ConversationKind>> {
        let kind: Option<String> = sqlx::query_scalar("SELECT kind FROM conversations WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        kind.map(|value| value.parse()).transpose()
    }

    /// Existing direct conversation between two users, if any.
    pub async fn find_direct_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> StoreResult<Option<Conversation>> {
        self.find_by_direct_key(&direct_key(a, b)).await
    }

    /// Conversations the user belongs to, most recently active first.
    pub async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS}
             FROM conversations c
             JOIN conversation_members cm ON cm.conversation_id = c.id
             WHERE cm.user_id = ?
             ORDER BY active_at DESC, c.created_at DESC, c.id ASC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut conversations = rows
            .iter()
            .map(conversation_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        let member_rows = sqlx::query(
            "SELECT conversation_id, user_id FROM conversation_members
             WHERE conversation_id IN (SELECT conversation_id FROM conversation_members WHERE user_id = ?)
             ORDER BY joined_at ASC, rowid ASC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut members: HashMap<String, Vec<UserId>> = HashMap::new();
        for row in &member_rows {
            let conversation_id: String = row.try_get("conversation_id")?;
            let member: String = row.try_get("user_id")?;
            members
                .entry(conversation_id)
                .or_default()
                .push(UserId::new(member));
        }

        for conversation in &mut conversations {
            conversation.member_ids = members
                .remove(conversation.id.as_str())
                .unwrap_or_default();
        }

        debug!(user_id = %user_id, count = conversations.len(), "listed conversations");
        Ok(conversations)
    }

    pub async fn members_of(&self, id: &ConversationId) -> StoreResult<Vec<UserId>> {
        let rows = sqlx::query(
            "SELECT user_id FROM conversation_members WHERE conversation_id = ? ORDER BY joined_at ASC, rowid ASC",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(UserId::new(row.try_get::<String, _>("user_id")?)))
            .collect()
    }

    async fn find_by_direct_key(&self, key: &str) -> StoreResult<Option<Conversation>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM conversations WHERE direct_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match id {
            Some(id) => self.find(&ConversationId::new(id)).await,
            None => Ok(None),
        }
    }
}

fn dedupe(ids: Vec<UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn normalise_name(name: Option<String>) -> StoreResult<Option<String>> {
    let Some(name) = name else {
        return Ok(None);
    };

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_CONVERSATION_NAME {
        return Err(StoreError::invalid_argument(format!(
            "conversation name too long (max {MAX_CONVERSATION_NAME} characters)"
        )));
    }

    Ok(Some(trimmed.to_owned()))
}

fn conversation_from_row(row: &SqliteRow) -> StoreResult<Conversation> {
    let kind: String = row.try_get("kind")?;
    let last_message_id: Option<i64> = row.try_get("last_message_id")?;

    Ok(Conversation {
        id: ConversationId::new(row.try_get::<String, _>("id")?),
        kind: kind.parse()?,
        name: row.try_get("name")?,
        member_ids: Vec::new(),
        created_at: row.try_get("created_at")?,
        last_message_id: last_message_id.map(MessageId),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        let ids = vec![
            UserId::from("user_2"),
            UserId::from("user_1"),
            UserId::from("user_2"),
        ];
        assert_eq!(
            dedupe(ids),
            vec![UserId::from("user_2"), UserId::from("user_1")]
        );
    }

    #[test]
    fn blank_names_are_treated_as_absent() {
        assert_eq!(normalise_name(Some("   ".into())).unwrap(), None);
        assert_eq!(
            normalise_name(Some(" Study Group ".into())).unwrap(),
            Some("Study Group".to_string())
        );
        assert!(normalise_name(Some("x".repeat(256))).is_err());
    }
}

//! Repository for user lookups and provisioning.

use std::collections::HashSet;

use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::entities::{NewUser, User, UserId};
use crate::types::{timestamp, StoreResult};

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user or refresh the display fields of an existing one.
    pub async fn upsert(&self, user: &NewUser) -> StoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, display_name, avatar, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name, avatar = excluded.avatar",
        )
        .bind(user.id.as_str())
        .bind(&user.display_name)
        .bind(user.avatar.as_deref())
        .bind(timestamp())
        .execute(&self.pool)
        .await?;

        info!(user_id = %user.id, "provisioned user");

        self.find(&user.id)
            .await?
            .ok_or_else(|| crate::StoreError::not_found("user", user.id.as_str()))
    }

    pub async fn find(&self, id: &UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, display_name, avatar, created_at FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, display_name, avatar, created_at FROM users ORDER BY display_name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "listed users");
        rows.iter().map(user_from_row).collect()
    }

    /// Returns the subset of `ids` that do not name a provisioned user.
    pub async fn missing(&self, ids: &[UserId]) -> StoreResult<Vec<UserId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM users WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let found: HashSet<String> = query
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("id"))
            .collect::<Result<_, _>>()?;

        Ok(ids
            .iter()
            .filter(|id| !found.contains(id.as_str()))
            .cloned()
            .collect())
    }
}

fn user_from_row(row: &SqliteRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id")?),
        display_name: row.try_get("display_name")?,
        avatar: row.try_get("avatar")?,
        created_at: row.try_get("created_at")?,
    })
}

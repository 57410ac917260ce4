use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use huddle_config::AuthConfig;
use huddle_database::UserId;
use rand::RngCore;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

/// Roughly a century; larger configured TTLs are clamped.
const MAX_SESSION_TTL_SECONDS: u64 = 100 * 365 * 86_400;

/// Opaque bearer tokens mapped to provisioned users.
///
/// Credential checks live outside this service; it only issues and resolves
/// session tokens for users that already exist in the store.
#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown user {0}")]
    UnknownUser(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let seconds = config.session_ttl_seconds.min(MAX_SESSION_TTL_SECONDS) as i64;
        let session_ttl = Duration::seconds(seconds);

        Self { pool, session_ttl }
    }

    pub async fn issue_session(&self, user_id: &UserId) -> Result<AuthSession, AuthError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        if !exists {
            return Err(AuthError::UnknownUser(user_id.to_string()));
        }

        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query("INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&token)
            .bind(user_id.as_str())
            .bind(now.to_rfc3339())
            .bind(expires_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        info!(user_id = %user_id, "issued session");

        Ok(AuthSession {
            token,
            user_id: user_id.clone(),
            expires_at,
        })
    }

    /// Resolve a bearer token to its session, deleting it once expired.
    pub async fn authenticate_token(&self, token: &str) -> Result<AuthSession, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidSession);
        }

        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: String = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            self.revoke(token).await?;
            return Err(AuthError::SessionExpired);
        }

        debug!(user_id = %user_id, "authenticated session token");

        Ok(AuthSession {
            token: token.to_owned(),
            user_id: UserId::new(user_id),
            expires_at,
        })
    }

    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

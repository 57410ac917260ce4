//! Huddle Database Crate
//!
//! The conversation store: connection management, migrations, entities and
//! the repositories that own users, conversations, membership and messages.

use huddle_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod seed;
#[cfg(feature = "test-support")]
pub mod test_support;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{
    ConversationRepository, MemberRepository, MessageRepository, UserRepository,
    DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};

pub use entities::{
    Conversation, ConversationId, ConversationKind, Message, MessageId, NewConversation,
    NewUser, Sender, User, UserId, MAX_CONVERSATION_NAME,
};

pub use types::{timestamp, StoreError, StoreResult};

pub use sqlx::SqlitePool as Pool;

/// Connect and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| StoreError::Connection(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| StoreError::Migration(format!("{e:#}")))?;

    Ok(pool)
}

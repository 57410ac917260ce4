//! Temporary on-disk databases for tests in dependent crates.

use huddle_config::DatabaseConfig;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::entities::NewUser;
use crate::repos::UserRepository;
use crate::types::StoreResult;

pub struct TestDatabase {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Migrated database in a fresh temp directory, removed on drop.
    pub async fn open() -> StoreResult<Self> {
        let temp_dir = TempDir::new()
            .map_err(|e| crate::StoreError::Connection(e.to_string()))?;
        let db_path = temp_dir.path().join("huddle-test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };

        let pool = crate::initialize_database(&config).await?;
        Ok(Self {
            pool,
            _temp_dir: temp_dir,
        })
    }

    pub async fn with_users(ids: &[&str]) -> StoreResult<Self> {
        let database = Self::open().await?;
        database.add_users(ids).await?;
        Ok(database)
    }

    pub async fn add_users(&self, ids: &[&str]) -> StoreResult<()> {
        let users = UserRepository::new(self.pool.clone());
        for id in ids {
            users.upsert(&NewUser::new(*id, format!("User {id}"))).await?;
        }
        Ok(())
    }
}

use std::sync::Arc;

use anyhow::{Context, Result};
use huddle_auth::Authenticator;
use huddle_config::AppConfig;
use huddle_database::initialize_database;
use huddle_orchestrator::{AssistantResponder, Orchestrator};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Process-wide services shared by every command.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub orchestrator: Arc<Orchestrator>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone());
        let orchestrator = Arc::new(
            Orchestrator::new(config)
                .bootstrap()
                .context("failed to bootstrap orchestrator")?,
        );

        info!(
            model = orchestrator.active_model(),
            configured = orchestrator.is_configured(),
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            orchestrator,
        })
    }

    /// The orchestrator behind the responder seam used by the message pipeline.
    pub fn responder(&self) -> Arc<dyn AssistantResponder> {
        self.orchestrator.clone()
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

//! Shared application state for the gateway

use std::sync::Arc;

use huddle_auth::Authenticator;
use huddle_chats::ChatServices;
use huddle_config::{AppConfig, RealtimeConfig};
use huddle_database::Pool;
use huddle_orchestrator::AssistantResponder;

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    /// Messaging core: conversations, send pipeline, guard, broadcaster
    pub chats: ChatServices,
    /// Session token authentication
    pub authenticator: Authenticator,
    /// Per-session realtime settings
    pub realtime: RealtimeConfig,
}

impl GatewayState {
    pub fn new(
        pool: Pool,
        authenticator: Authenticator,
        responder: Arc<dyn AssistantResponder>,
        config: &AppConfig,
    ) -> Self {
        Self {
            chats: ChatServices::new(pool, responder, &config.orchestrator),
            authenticator,
            realtime: config.realtime.clone(),
        }
    }

    pub fn chats(&self) -> &ChatServices {
        &self.chats
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}

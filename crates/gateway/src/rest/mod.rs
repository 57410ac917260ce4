//! REST API endpoints for the gateway

pub mod conversation;
pub mod health;
pub mod message;
pub mod user;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Routes nested under `/api`; every one of them requires a caller.
pub fn create_api_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .merge(user::create_user_routes())
        .merge(conversation::create_conversation_routes())
        .merge(message::create_message_routes())
}

/// Routes reachable without a token.
pub fn create_public_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/health", get(health::health_check))
}

// Re-export for convenience
pub use conversation::*;
pub use health::*;
pub use message::*;
pub use user::*;

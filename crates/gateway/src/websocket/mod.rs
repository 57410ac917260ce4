//! WebSocket endpoints for the gateway

pub mod conversation;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all WebSocket routes
pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/ws", get(conversation::conversation_websocket_handler))
}

// Re-export for convenience
pub use conversation::*;

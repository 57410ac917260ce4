//! # Huddle Gateway Crate
//!
//! HTTP REST and WebSocket surface for the messaging core. Requests are
//! authenticated with session tokens and routed to the services in
//! `huddle-chats`.
//!
//! ## Architecture
//!
//! - **REST**: HTTP API endpoints with OpenAPI documentation
//! - **WebSocket**: Realtime sessions that join conversations and receive new messages
//! - **State**: Shared application state for services
//! - **Middleware**: Authentication, CORS and request logging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_gateway::{create_router, GatewayState};
//!
//! let state = GatewayState::new(pool, authenticator, responder, &config);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

// Re-export main types for convenience
pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use middleware::{auth_middleware, CallerIdentity};
pub use state::GatewayState;

pub use create_router as build_router;

use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    let api = rest::create_api_routes().route_layer(axum_middleware::from_fn_with_state(
        arc_state.clone(),
        middleware::auth_middleware,
    ));

    #[allow(unused_mut)]
    let mut router = Router::new()
        // Unauthenticated routes
        .merge(rest::create_public_routes().with_state(arc_state.clone()))
        // REST API routes
        .nest("/api", api.with_state(arc_state.clone()))
        // WebSocket routes
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        // CORS middleware
        .layer(middleware::create_cors_middleware())
        // Logging middleware
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    // Add Swagger UI if in debug mode
    #[cfg(debug_assertions)]
    {
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    router
}

#[cfg(debug_assertions)]
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::health::health_check,
        rest::user::list_users,
        rest::conversation::list_conversations,
        rest::conversation::create_conversation,
        rest::conversation::get_conversation,
        rest::message::list_messages,
        rest::message::send_message,
    ),
    components(
        schemas(
            error::ErrorResponse,
            rest::health::HealthResponse,
            rest::user::UserResponse,
            rest::conversation::ConversationResponse,
            rest::conversation::CreateConversationRequest,
            rest::message::MessageResponse,
            rest::message::SendMessageRequest,
            rest::message::SendMessageResponse,
            rest::message::ListMessagesQuery,
            rest::message::ListMessagesResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Users", description = "Provisioned users"),
        (name = "Conversations", description = "Conversation management"),
        (name = "Messages", description = "Message history and sending"),
    )
)]
pub struct ApiDoc;

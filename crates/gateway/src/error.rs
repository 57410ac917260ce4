//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use huddle_auth::AuthError;
use huddle_chats::ChatError;
use huddle_database::StoreError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Assistant unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<ChatError> for GatewayError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::InvalidArgument { message } => GatewayError::InvalidRequest(message),
            ChatError::Forbidden { reason } => GatewayError::AuthorizationFailed(reason),
            ChatError::NotFound { entity, id } => {
                GatewayError::NotFound(format!("{entity} {id}"))
            }
            ChatError::UpstreamUnavailable { message } => {
                GatewayError::UpstreamUnavailable(message)
            }
            ChatError::Internal { message } => GatewayError::InternalError(message),
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        ChatError::from(error).into()
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Database(err) => {
                error!(error = %err, "session lookup failed");
                GatewayError::InternalError("session lookup failed".to_string())
            }
            other => GatewayError::AuthenticationFailed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(format!("JSON serialization error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_errors_map_to_statuses() {
        let cases = [
            (ChatError::invalid_argument("empty"), StatusCode::BAD_REQUEST),
            (ChatError::forbidden("no"), StatusCode::FORBIDDEN),
            (ChatError::not_found("user", "u9"), StatusCode::NOT_FOUND),
            (ChatError::upstream_unavailable("down"), StatusCode::BAD_GATEWAY),
            (ChatError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(GatewayError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for error in [
            AuthError::SessionNotFound,
            AuthError::SessionExpired,
            AuthError::InvalidSession,
        ] {
            assert_eq!(
                GatewayError::from(error).status_code(),
                StatusCode::UNAUTHORIZED
            );
        }
    }
}

//! Error types for the messaging core.

use huddle_database::StoreError;
use huddle_orchestrator::OrchestratorError;
use thiserror::Error;
use tracing::error;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the messaging core
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Assistant unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ChatError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::InvalidArgument { .. } => "invalid_argument",
            ChatError::Forbidden { .. } => "forbidden",
            ChatError::NotFound { .. } => "not_found",
            ChatError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ChatError::Internal { .. } => "internal",
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidArgument(message) => Self::InvalidArgument { message },
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Forbidden(reason) => Self::Forbidden { reason },
            other => {
                error!(error = %other, "store failure");
                Self::Internal {
                    message: other.to_string(),
                }
            }
        }
    }
}

impl From<OrchestratorError> for ChatError {
    fn from(err: OrchestratorError) -> Self {
        Self::UpstreamUnavailable {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_category() {
        assert_eq!(
            ChatError::from(StoreError::invalid_argument("too few")).code(),
            "invalid_argument"
        );
        assert_eq!(
            ChatError::from(StoreError::not_found("user", "ghost")).code(),
            "not_found"
        );
        assert_eq!(
            ChatError::from(StoreError::forbidden("nope")).code(),
            "forbidden"
        );
        assert_eq!(
            ChatError::from(StoreError::Corrupt("bad row".into())).code(),
            "internal"
        );
    }

    #[test]
    fn orchestrator_errors_become_upstream_unavailable() {
        let err = ChatError::from(OrchestratorError::EmptyReply);
        assert_eq!(err.code(), "upstream_unavailable");
    }
}

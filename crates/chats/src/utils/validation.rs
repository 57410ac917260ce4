//! Validation utilities.

use crate::types::{ChatError, ChatResult};

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 100_000;

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Reject empty, whitespace-only and oversized message bodies.
    pub fn message_body(body: &str) -> ChatResult<()> {
        if body.trim().is_empty() {
            return Err(ChatError::invalid_argument("message body cannot be empty"));
        }

        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::invalid_argument(format!(
                "message body too long (max {MAX_MESSAGE_LENGTH} characters)"
            )));
        }

        Ok(())
    }

    /// Validate an optional conversation name. Surrounding whitespace is
    /// trimmed before storage, so it does not count towards the limit.
    pub fn conversation_name(name: Option<&str>) -> ChatResult<()> {
        match name {
            Some(name) if name.trim().chars().count() > huddle_database::MAX_CONVERSATION_NAME => {
                Err(ChatError::invalid_argument(format!(
                    "conversation name too long (max {} characters)",
                    huddle_database::MAX_CONVERSATION_NAME
                )))
            }
            _ => Ok(()),
        }
    }
}

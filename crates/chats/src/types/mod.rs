//! Shared types for the messaging core

pub mod errors;
pub mod events;
pub mod requests;

pub use errors::{ChatError, ChatResult};
pub use events::ConversationEvent;
pub use requests::{HistoryQuery, StartConversationRequest};

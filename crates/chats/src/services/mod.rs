//! Business logic services for conversations and messages

pub mod broadcaster;
pub mod completion_service;
pub mod conversation_service;
pub mod message_pipeline;

pub use broadcaster::{PublishReport, RealtimeBroadcaster, SessionHandle, SessionId};
pub use completion_service::{CompletionOutcome, CompletionService};
pub use conversation_service::{ConversationService, StartedConversation};
pub use message_pipeline::{MessagePipeline, SendOutcome};

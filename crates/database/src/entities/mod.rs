//! Domain entities for the conversation store

pub mod conversation;
pub mod ids;
pub mod message;
pub mod user;

pub use conversation::{
    direct_key, Conversation, ConversationKind, NewConversation, MAX_CONVERSATION_NAME,
};
pub use ids::{ConversationId, MessageId, UserId};
pub use message::{Message, Sender};
pub use user::{NewUser, User};

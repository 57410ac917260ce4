//! Event types for realtime conversation updates.

use huddle_database::{ConversationId, Message};
use serde::{Deserialize, Serialize};

/// Event fanned out to every session joined to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConversationEvent {
    NewMessage {
        conversation_id: ConversationId,
        message: Message,
    },
}

impl ConversationEvent {
    pub fn new_message(message: &Message) -> Self {
        Self::NewMessage {
            conversation_id: message.conversation_id.clone(),
            message: message.clone(),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            ConversationEvent::NewMessage {
                conversation_id, ..
            } => conversation_id,
        }
    }
}

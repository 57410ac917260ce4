//! Message entity definitions

use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, MessageId, UserId};

/// Author of a message. The assistant is not a user and has no user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Sender {
    User(UserId),
    Assistant,
}

impl Sender {
    pub fn is_assistant(&self) -> bool {
        matches!(self, Sender::Assistant)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Sender::User(id) => Some(id),
            Sender::Assistant => None,
        }
    }
}

impl From<UserId> for Sender {
    fn from(id: UserId) -> Self {
        Sender::User(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: Sender,
    pub body: String,
    pub created_at: String,
}

impl Message {
    pub fn is_assistant(&self) -> bool {
        self.sender.is_assistant()
    }
}

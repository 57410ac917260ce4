//! Conversation entity definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, MessageId, UserId};
use crate::types::StoreError;

/// Longest accepted conversation name, in characters.
pub const MAX_CONVERSATION_NAME: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub member_ids: Vec<UserId>,
    pub created_at: String,
    pub last_message_id: Option<MessageId>,
}

impl Conversation {
    pub fn has_member(&self, user_id: &UserId) -> bool {
        self.member_ids.iter().any(|member| member == user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
    Assistant,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Direct => "direct",
            ConversationKind::Group => "group",
            ConversationKind::Assistant => "assistant",
        }
    }

    /// Inclusive bounds on the number of real (user) members.
    ///
    /// The assistant participant is implied by the kind and never counted.
    pub fn member_bounds(&self) -> (usize, usize) {
        match self {
            ConversationKind::Direct => (2, 2),
            ConversationKind::Group => (2, usize::MAX),
            ConversationKind::Assistant => (1, 1),
        }
    }

    pub fn requires_name(&self) -> bool {
        matches!(self, ConversationKind::Group)
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(ConversationKind::Direct),
            "group" => Ok(ConversationKind::Group),
            "assistant" => Ok(ConversationKind::Assistant),
            other => Err(StoreError::Corrupt(format!(
                "unknown conversation kind `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversation {
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub member_ids: Vec<UserId>,
}

impl NewConversation {
    pub fn group(name: impl Into<String>, member_ids: Vec<UserId>) -> Self {
        Self {
            kind: ConversationKind::Group,
            name: Some(name.into()),
            member_ids,
        }
    }

    pub fn direct(a: UserId, b: UserId) -> Self {
        Self {
            kind: ConversationKind::Direct,
            name: None,
            member_ids: vec![a, b],
        }
    }

    pub fn assistant(owner: UserId) -> Self {
        Self {
            kind: ConversationKind::Assistant,
            name: None,
            member_ids: vec![owner],
        }
    }
}

/// Order-independent key identifying the direct conversation between two users.
pub fn direct_key(a: &UserId, b: &UserId) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

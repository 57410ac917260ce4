//! Request types accepted by the chat services.

use huddle_database::{ConversationKind, UserId};
use serde::{Deserialize, Serialize};

/// Start a conversation. The caller is always added to `member_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartConversationRequest {
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<UserId>,
}

/// Cursor parameters for reading history.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub since: Option<i64>,
    pub limit: Option<u32>,
}

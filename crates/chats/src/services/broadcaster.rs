//! Realtime fan-out of conversation events to connected sessions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use huddle_database::{ConversationId, UserId};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::ConversationEvent;

pub type SessionId = Uuid;

/// Sending half of one connected session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub user_id: UserId,
    sender: mpsc::Sender<ConversationEvent>,
}

impl SessionHandle {
    /// A handle plus the receiver its connection should drain. `buffer` is
    /// how many events may queue before the session counts as slow.
    pub fn new(user_id: UserId, buffer: usize) -> (Self, mpsc::Receiver<ConversationEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (
            Self {
                id: Uuid::new_v4(),
                user_id,
                sender,
            },
            receiver,
        )
    }
}

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub pruned: usize,
}

#[derive(Debug, Default)]
struct Registry {
    rooms: HashMap<ConversationId, HashMap<SessionId, SessionHandle>>,
    sessions: HashMap<SessionId, HashSet<ConversationId>>,
}

/// Tracks which sessions are joined to which conversations.
///
/// Publishing never blocks on a session: a full queue drops the event for
/// that session only, and a closed one is removed.
#[derive(Clone, Default)]
pub struct RealtimeBroadcaster {
    registry: Arc<RwLock<Registry>>,
}

impl RealtimeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session to conversations. Returns how many subscriptions
    /// were new; repeating a join is a no-op.
    pub async fn join(&self, session: &SessionHandle, conversation_ids: &[ConversationId]) -> usize {
        let mut registry = self.registry.write().await;
        let mut added = 0;

        for conversation_id in conversation_ids {
            let room = registry.rooms.entry(conversation_id.clone()).or_default();
            if room.insert(session.id, session.clone()).is_none() {
                added += 1;
            }
            registry
                .sessions
                .entry(session.id)
                .or_default()
                .insert(conversation_id.clone());
        }

        debug!(session_id = %session.id, user_id = %session.user_id, added, "session joined conversations");
        added
    }

    /// Remove every subscription held by a session. Unknown sessions are ignored.
    pub async fn leave(&self, session_id: SessionId) {
        let mut registry = self.registry.write().await;
        let Some(conversations) = registry.sessions.remove(&session_id) else {
            return;
        };

        for conversation_id in conversations {
            if let Some(room) = registry.rooms.get_mut(&conversation_id) {
                room.remove(&session_id);
                if room.is_empty() {
                    registry.rooms.remove(&conversation_id);
                }
            }
        }

        debug!(session_id = %session_id, "session left all conversations");
    }

    /// Deliver an event to every session joined to its conversation.
    pub async fn publish(&self, event: ConversationEvent) -> PublishReport {
        let conversation_id = event.conversation_id().clone();
        let targets: Vec<SessionHandle> = {
            let registry = self.registry.read().await;
            registry
                .rooms
                .get(&conversation_id)
                .map(|room| room.values().cloned().collect())
                .unwrap_or_default()
        };

        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for target in targets {
            match target.sender.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        session_id = %target.id,
                        conversation_id = %conversation_id,
                        "session queue full, dropping event"
                    );
                    report.dropped += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(target.id),
            }
        }

        for session_id in closed {
            self.leave(session_id).await;
            report.pruned += 1;
        }

        debug!(
            conversation_id = %conversation_id,
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "published event"
        );
        report
    }

    pub async fn subscriber_count(&self, conversation_id: &ConversationId) -> usize {
        self.registry
            .read()
            .await
            .rooms
            .get(conversation_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    pub async fn session_count(&self) -> usize {
        self.registry.read().await.sessions.len()
    }
}

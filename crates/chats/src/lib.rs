//! # Huddle Chats Crate
//!
//! The messaging core: who may read and write a conversation, the send
//! pipeline that persists and fans out messages, the assistant turn, and the
//! realtime broadcaster that connected sessions join.
//!
//! ## Architecture
//!
//! - **Services**: conversation service, message pipeline, completion service, broadcaster
//! - **Types**: errors, events and requests
//! - **Utils**: membership guard and validation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_chats::ChatServices;
//!
//! let chats = ChatServices::new(pool, responder, &config.orchestrator);
//! let sent = chats.pipeline.send(&caller, &conversation_id, "hello").await?;
//! ```

use std::sync::Arc;

use huddle_config::OrchestratorConfig;
use huddle_database::{
    ConversationRepository, MemberRepository, MessageRepository, Pool, UserRepository,
};
use huddle_orchestrator::AssistantResponder;

pub mod services;
pub mod types;
pub mod utils;

pub use services::{
    CompletionOutcome, CompletionService, ConversationService, MessagePipeline, PublishReport,
    RealtimeBroadcaster, SendOutcome, SessionHandle, SessionId, StartedConversation,
};
pub use types::{ChatError, ChatResult, ConversationEvent, HistoryQuery, StartConversationRequest};
pub use utils::{Access, Decision, DenyReason, MembershipGuard, Validator};

/// Every messaging service wired against one pool and one broadcaster.
#[derive(Clone)]
pub struct ChatServices {
    pub users: UserRepository,
    pub conversations: ConversationService,
    pub pipeline: MessagePipeline,
    pub guard: MembershipGuard,
    pub broadcaster: RealtimeBroadcaster,
}

impl ChatServices {
    pub fn new(
        pool: Pool,
        responder: Arc<dyn AssistantResponder>,
        config: &OrchestratorConfig,
    ) -> Self {
        let users = UserRepository::new(pool.clone());
        let conversation_repository = ConversationRepository::new(pool.clone());
        let message_repository = MessageRepository::new(pool.clone());
        let guard = MembershipGuard::new(MemberRepository::new(pool));
        let broadcaster = RealtimeBroadcaster::new();
        let completions = CompletionService::from_config(responder, config);

        let conversations = ConversationService::new(
            conversation_repository.clone(),
            message_repository.clone(),
            guard.clone(),
        );
        let pipeline = MessagePipeline::new(
            conversation_repository,
            message_repository,
            guard.clone(),
            broadcaster.clone(),
            completions,
            config.context_turns,
        );

        Self {
            users,
            conversations,
            pipeline,
            guard,
            broadcaster,
        }
    }
}

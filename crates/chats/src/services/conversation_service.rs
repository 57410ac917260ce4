//! Conversation service: creation, listing and guarded reads.

use huddle_database::{
    Conversation, ConversationId, ConversationRepository, Message, MessageId, MessageRepository,
    NewConversation, UserId,
};
use tracing::info;

use crate::types::{ChatError, ChatResult, StartConversationRequest};
use crate::utils::{Access, MembershipGuard, Validator};

/// Result of [`ConversationService::start`].
#[derive(Debug, Clone)]
pub struct StartedConversation {
    pub conversation: Conversation,
    /// `false` when an existing direct conversation was returned.
    pub created: bool,
}

/// Service for conversation operations
#[derive(Clone)]
pub struct ConversationService {
    conversations: ConversationRepository,
    messages: MessageRepository,
    guard: MembershipGuard,
}

impl ConversationService {
    pub fn new(
        conversations: ConversationRepository,
        messages: MessageRepository,
        guard: MembershipGuard,
    ) -> Self {
        Self {
            conversations,
            messages,
            guard,
        }
    }

    /// Create a conversation on behalf of `caller`, who is always a member.
    pub async fn start(
        &self,
        caller: &UserId,
        request: StartConversationRequest,
    ) -> ChatResult<StartedConversation> {
        Validator::conversation_name(request.name.as_deref())?;

        let mut member_ids = Vec::with_capacity(request.member_ids.len() + 1);
        member_ids.push(caller.clone());
        member_ids.extend(request.member_ids);

        let (conversation, created) = self
            .conversations
            .create_or_reuse(NewConversation {
                kind: request.kind,
                name: request.name,
                member_ids,
            })
            .await?;

        info!(
            conversation_id = %conversation.id,
            kind = %conversation.kind,
            caller = %caller,
            created,
            "conversation started"
        );
        Ok(StartedConversation {
            conversation,
            created,
        })
    }

    /// Conversations the caller belongs to, most recently active first.
    pub async fn list(&self, caller: &UserId) -> ChatResult<Vec<Conversation>> {
        Ok(self.conversations.list_for_user(caller).await?)
    }

    pub async fn get(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
    ) -> ChatResult<Conversation> {
        self.guard.require(caller, conversation_id, Access::Read).await?;

        self.conversations
            .find(conversation_id)
            .await?
            .ok_or_else(|| ChatError::not_found("conversation", conversation_id.as_str()))
    }

    /// Messages after the `since` cursor, ascending, for a member.
    pub async fn history(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        since: Option<MessageId>,
        limit: Option<u32>,
    ) -> ChatResult<Vec<Message>> {
        self.guard.require(caller, conversation_id, Access::Read).await?;
        Ok(self.messages.history(conversation_id, since, limit).await?)
    }
}

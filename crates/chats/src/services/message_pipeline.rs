//! The send path: validate, authorize, persist, fan out, and run the
//! assistant turn for assistant conversations.

use huddle_database::{
    ConversationId, ConversationKind, ConversationRepository, Message, MessageRepository, Sender,
    UserId,
};
use huddle_orchestrator::{AssistantRequest, AssistantTurn};
use tracing::{error, info};

use crate::services::broadcaster::RealtimeBroadcaster;
use crate::services::completion_service::CompletionService;
use crate::types::{ChatError, ChatResult, ConversationEvent};
use crate::utils::{Access, MembershipGuard, Validator, NOT_A_MEMBER};

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message: Message,
    /// Assistant reply, present only for assistant conversations.
    pub reply: Option<Message>,
}

#[derive(Clone)]
pub struct MessagePipeline {
    conversations: ConversationRepository,
    messages: MessageRepository,
    guard: MembershipGuard,
    broadcaster: RealtimeBroadcaster,
    completions: CompletionService,
    context_turns: u32,
}

impl MessagePipeline {
    pub fn new(
        conversations: ConversationRepository,
        messages: MessageRepository,
        guard: MembershipGuard,
        broadcaster: RealtimeBroadcaster,
        completions: CompletionService,
        context_turns: u32,
    ) -> Self {
        Self {
            conversations,
            messages,
            guard,
            broadcaster,
            completions,
            context_turns,
        }
    }

    /// Send a message as `caller`.
    ///
    /// Everything that can reject the send runs before the append. Once the
    /// message is stored, fan-out and the assistant turn run on a detached
    /// task, so dropping the returned future cannot strand an accepted
    /// message without its reply.
    pub async fn send(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        body: &str,
    ) -> ChatResult<SendOutcome> {
        Validator::message_body(body)?;
        self.guard.require(caller, conversation_id, Access::Write).await?;

        let kind = self
            .conversations
            .kind_of(conversation_id)
            .await?
            .ok_or_else(|| ChatError::forbidden(NOT_A_MEMBER))?;

        let message = self
            .messages
            .append(conversation_id, &Sender::User(caller.clone()), body)
            .await?;

        let pipeline = self.clone();
        let accepted = message.clone();
        let delivery = tokio::spawn(async move { pipeline.deliver(accepted, kind).await });

        let reply = match delivery.await {
            Ok(reply) => reply,
            Err(join_error) => {
                error!(conversation_id = %conversation_id, error = %join_error, "delivery task failed");
                None
            }
        };

        Ok(SendOutcome { message, reply })
    }

    async fn deliver(&self, message: Message, kind: ConversationKind) -> Option<Message> {
        self.broadcaster
            .publish(ConversationEvent::new_message(&message))
            .await;

        if kind != ConversationKind::Assistant {
            return None;
        }

        match self.assistant_turn(&message).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                error!(conversation_id = %message.conversation_id, error = %err, "assistant reply could not be stored");
                None
            }
        }
    }

    /// Produce, persist and publish the assistant's answer to `trigger`.
    pub async fn assistant_turn(&self, trigger: &Message) -> ChatResult<Message> {
        if trigger.is_assistant() {
            return Err(ChatError::invalid_argument(
                "assistant replies only answer user messages",
            ));
        }

        let context = if self.context_turns == 0 {
            Vec::new()
        } else {
            self.messages
                .recent(&trigger.conversation_id, trigger.id, self.context_turns)
                .await?
        };

        let request = AssistantRequest {
            conversation_id: trigger.conversation_id.clone(),
            prompt: trigger.body.clone(),
            context: context.iter().map(AssistantTurn::from).collect(),
        };

        let outcome = self.completions.complete(request).await;
        let fallback = outcome.is_fallback();

        let reply = self
            .messages
            .append(&trigger.conversation_id, &Sender::Assistant, outcome.text())
            .await?;

        info!(
            conversation_id = %reply.conversation_id,
            message_id = %reply.id,
            in_reply_to = %trigger.id,
            fallback,
            "assistant replied"
        );

        self.broadcaster
            .publish(ConversationEvent::new_message(&reply))
            .await;

        Ok(reply)
    }
}

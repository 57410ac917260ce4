//! Completion service for assistant replies.

use std::sync::Arc;
use std::time::Duration;

use huddle_config::OrchestratorConfig;
use huddle_orchestrator::{AssistantRequest, AssistantResponder, OrchestratorError};
use tracing::{debug, warn};

use crate::types::{ChatError, ChatResult};

/// What the assistant turn should persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Reply(String),
    Fallback { reply: String, reason: String },
}

impl CompletionOutcome {
    pub fn text(&self) -> &str {
        match self {
            CompletionOutcome::Reply(reply) => reply,
            CompletionOutcome::Fallback { reply, .. } => reply,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CompletionOutcome::Fallback { .. })
    }
}

/// Wraps a responder with a deadline and the fallback policy.
#[derive(Clone)]
pub struct CompletionService {
    responder: Arc<dyn AssistantResponder>,
    timeout: Duration,
    fallback_reply: String,
}

impl CompletionService {
    pub fn new(
        responder: Arc<dyn AssistantResponder>,
        timeout: Duration,
        fallback_reply: impl Into<String>,
    ) -> Self {
        Self {
            responder,
            timeout,
            fallback_reply: fallback_reply.into(),
        }
    }

    pub fn from_config(responder: Arc<dyn AssistantResponder>, config: &OrchestratorConfig) -> Self {
        Self::new(
            responder,
            Duration::from_secs(config.request_timeout_seconds),
            config.fallback_reply.clone(),
        )
    }

    /// Ask the responder, substituting the fallback text on any failure.
    pub async fn complete(&self, request: AssistantRequest) -> CompletionOutcome {
        let conversation_id = request.conversation_id.clone();

        match self.try_complete(request).await {
            Ok(reply) => CompletionOutcome::Reply(reply),
            Err(err) => {
                warn!(
                    conversation_id = %conversation_id,
                    error = %err,
                    "assistant reply failed, using fallback"
                );
                CompletionOutcome::Fallback {
                    reply: self.fallback_reply.clone(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Ask the responder, surfacing failures as `UpstreamUnavailable`.
    pub async fn try_complete(&self, request: AssistantRequest) -> ChatResult<String> {
        debug!(
            conversation_id = %request.conversation_id,
            context = request.context.len(),
            "requesting assistant reply"
        );

        let reply = tokio::time::timeout(self.timeout, self.responder.respond(request))
            .await
            .map_err(|_| {
                ChatError::upstream_unavailable(format!(
                    "assistant did not answer within {}s",
                    self.timeout.as_secs_f32()
                ))
            })??;

        if reply.trim().is_empty() {
            return Err(OrchestratorError::EmptyReply.into());
        }

        Ok(reply)
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use huddle_config::{AppConfig, OrchestratorConfig};
use huddle_database::{ConversationId, Message, Sender};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("missing assistant API key")]
    ApiKeyMissing,
    #[error("assistant http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid assistant response: {0}")]
    InvalidResponse(String),
    #[error("assistant returned an empty reply")]
    EmptyReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One prior message handed to the responder as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub role: TurnRole,
    pub content: String,
}

impl From<&Message> for AssistantTurn {
    fn from(message: &Message) -> Self {
        let role = match message.sender {
            Sender::Assistant => TurnRole::Assistant,
            Sender::User(_) => TurnRole::User,
        };
        Self {
            role,
            content: message.body.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub conversation_id: ConversationId,
    pub prompt: String,
    pub context: Vec<AssistantTurn>,
}

/// Produces the assistant's reply to a prompt.
#[async_trait]
pub trait AssistantResponder: Send + Sync {
    async fn respond(&self, request: AssistantRequest) -> Result<String, OrchestratorError>;
}

/// OpenAI-compatible chat completions client.
pub struct Orchestrator {
    config: OrchestratorConfig,
    api_key: Option<String>,
    client: Client,
}

impl Orchestrator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.orchestrator.clone(),
            api_key: None,
            client: Client::new(),
        }
    }

    /// Resolve the API key and build the HTTP client.
    ///
    /// A missing key is not fatal: the orchestrator still starts and every
    /// call fails with [`OrchestratorError::ApiKeyMissing`].
    pub fn bootstrap(mut self) -> Result<Self, OrchestratorError> {
        let (api_key, source) = match self.config.api_key.clone() {
            Some(key) => (Some(key), "config"),
            None => (std::env::var("OPENAI_API_KEY").ok(), "env"),
        };

        match api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                debug!(source, "assistant api key resolved");
            }
            _ => warn!("no assistant api key configured, replies will use the fallback text"),
        }

        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self.client = Client::builder()
            .timeout(Duration::from_secs(self.config.request_timeout_seconds))
            .build()?;

        info!(model = %self.config.model, base_url = %self.config.base_url, "orchestrator ready");
        Ok(self)
    }

    pub fn active_model(&self) -> &str {
        &self.config.model
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_body<'a>(&'a self, request: &'a AssistantRequest) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(request.context.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: &self.config.system_prompt,
        });
        for turn in &request.context {
            messages.push(ChatMessage {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "assistant",
                },
                content: &turn.content,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatCompletionRequest {
            model: &self.config.model,
            messages,
        }
    }
}

#[async_trait]
impl AssistantResponder for Orchestrator {
    async fn respond(&self, request: AssistantRequest) -> Result<String, OrchestratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(OrchestratorError::ApiKeyMissing)?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = self.build_body(&request);

        debug!(
            conversation_id = %request.conversation_id,
            model = %self.config.model,
            context = request.context.len(),
            "requesting assistant reply"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %message, "assistant api error");
            return Err(OrchestratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| OrchestratorError::InvalidResponse(error.to_string()))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OrchestratorError::InvalidResponse("response has no choices".into()))?;

        if reply.trim().is_empty() {
            return Err(OrchestratorError::EmptyReply);
        }

        Ok(reply)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

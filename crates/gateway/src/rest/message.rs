//! Message REST endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use huddle_database::{ConversationId, Message, MessageId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::GatewayResult;
use crate::middleware::CallerIdentity;
use crate::state::GatewayState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Order key, strictly increasing within a conversation
    pub id: i64,
    pub conversation_id: String,
    /// `None` for assistant replies
    pub sender_id: Option<String>,
    pub is_assistant: bool,
    pub body: String,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        let is_assistant = message.is_assistant();
        Self {
            id: message.id.value(),
            conversation_id: message.conversation_id.into_inner(),
            sender_id: message.sender.user_id().map(|id| id.to_string()),
            is_assistant,
            body: message.body,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub message: MessageResponse,
    /// Assistant reply, for assistant conversations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<MessageResponse>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListMessagesQuery {
    /// Only messages with a larger order key
    pub since: Option<i64>,
    /// Page size, default 100, at most 500
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

pub fn create_message_routes() -> Router<Arc<GatewayState>> {
    Router::new().route(
        "/conversations/:conversation_id/messages",
        get(list_messages).post(send_message),
    )
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Messages",
    params(
        ("conversation_id" = String, Path, description = "Conversation id"),
        ListMessagesQuery
    ),
    responses(
        (status = 200, description = "Messages in ascending order", body = ListMessagesResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_messages(
    Path(conversation_id): Path<String>,
    Query(params): Query<ListMessagesQuery>,
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<CallerIdentity>,
) -> GatewayResult<Json<ListMessagesResponse>> {
    let messages = state
        .chats()
        .conversations
        .history(
            caller.user_id(),
            &ConversationId::from(conversation_id),
            params.since.map(MessageId),
            params.limit,
        )
        .await?;

    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Messages",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored and broadcast", body = SendMessageResponse),
        (status = 400, description = "Empty or oversized body", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_message(
    Path(conversation_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(request): Json<SendMessageRequest>,
) -> GatewayResult<(StatusCode, Json<SendMessageResponse>)> {
    let outcome = state
        .chats()
        .pipeline
        .send(
            caller.user_id(),
            &ConversationId::from(conversation_id),
            &request.body,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: outcome.message.into(),
            reply: outcome.reply.map(MessageResponse::from),
        }),
    ))
}

//! Conversation REST endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use huddle_chats::StartConversationRequest;
use huddle_database::{Conversation, ConversationId, ConversationKind, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayResult;
use crate::middleware::CallerIdentity;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    /// `direct`, `group` or `assistant`
    pub kind: String,
    pub name: Option<String>,
    pub member_ids: Vec<String>,
    pub created_at: String,
    pub last_message_id: Option<i64>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id.into_inner(),
            kind: conversation.kind.as_str().to_string(),
            name: conversation.name,
            member_ids: conversation
                .member_ids
                .into_iter()
                .map(UserId::into_inner)
                .collect(),
            created_at: conversation.created_at,
            last_message_id: conversation.last_message_id.map(|id| id.value()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    #[schema(value_type = String, example = "group")]
    pub kind: ConversationKind,
    pub name: Option<String>,
    /// Other members; the caller is always added.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub member_ids: Vec<UserId>,
}

pub fn create_conversation_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route("/conversations/:conversation_id", get(get_conversation))
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Conversations",
    responses(
        (status = 200, description = "Caller's conversations, most recently active first", body = Vec<ConversationResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_conversations(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<CallerIdentity>,
) -> GatewayResult<Json<Vec<ConversationResponse>>> {
    let conversations = state.chats().conversations.list(caller.user_id()).await?;
    Ok(Json(
        conversations
            .into_iter()
            .map(ConversationResponse::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 200, description = "Existing direct conversation with the same pair", body = ConversationResponse),
        (status = 400, description = "Invalid member set or name", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown member", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_conversation(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(request): Json<CreateConversationRequest>,
) -> GatewayResult<(StatusCode, Json<ConversationResponse>)> {
    let started = state
        .chats()
        .conversations
        .start(
            caller.user_id(),
            StartConversationRequest {
                kind: request.kind,
                name: request.name,
                member_ids: request.member_ids,
            },
        )
        .await?;

    let status = if started.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(started.conversation.into())))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation", body = ConversationResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_conversation(
    Path(conversation_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<CallerIdentity>,
) -> GatewayResult<Json<ConversationResponse>> {
    let conversation = state
        .chats()
        .conversations
        .get(caller.user_id(), &ConversationId::from(conversation_id))
        .await?;

    Ok(Json(conversation.into()))
}

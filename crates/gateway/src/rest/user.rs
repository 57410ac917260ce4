//! User directory endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use huddle_database::User;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::GatewayResult;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into_inner(),
            display_name: user.display_name,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

pub fn create_user_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/users", get(list_users))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Provisioned users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Json<Vec<UserResponse>>> {
    let users = state.chats().users.list().await?;

    debug!(count = users.len(), "listed users");
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

//! Conversation WebSocket sessions

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use huddle_chats::{Access, ConversationEvent, Decision, SessionHandle};
use huddle_database::{ConversationId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::rest::message::MessageResponse;
use crate::state::GatewayState;

/// Client events received from WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Heartbeat to keep connection alive
    Ping,
    /// Subscribe to conversations the caller is a member of
    Join {
        conversation_ids: Vec<ConversationId>,
    },
}

/// Server events sent to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Welcome message after successful connection
    Hello {
        session_id: String,
        user_id: String,
    },
    /// Heartbeat response
    Pong,
    /// Outcome of a join request
    Joined {
        accepted: Vec<ConversationId>,
        rejected: Vec<ConversationId>,
    },
    /// Error response
    Error {
        error: String,
        message: String,
    },
    /// New message in a joined conversation
    NewMessage {
        conversation_id: String,
        message: MessageResponse,
    },
}

impl From<ConversationEvent> for ServerEvent {
    fn from(event: ConversationEvent) -> Self {
        match event {
            ConversationEvent::NewMessage {
                conversation_id,
                message,
            } => ServerEvent::NewMessage {
                conversation_id: conversation_id.into_inner(),
                message: message.into(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

/// Upgrade an authenticated request into a realtime session.
pub async fn conversation_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WebSocketQuery>,
) -> GatewayResult<Response> {
    let token = query
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| GatewayError::AuthenticationFailed("Missing token".to_string()))?;

    let session = state.authenticator().authenticate_token(&token).await?;
    let user_id = session.user_id;

    Ok(ws.on_upgrade(move |socket| handle_conversation_websocket(socket, state, user_id)))
}

type WsSink = SplitSink<WebSocket, Message>;

async fn send_event(sink: &mut WsSink, event: &ServerEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => sink.send(Message::Text(text)).await,
        Err(error) => {
            warn!(%error, "failed to serialise server event");
            Ok(())
        }
    }
}

async fn handle_conversation_websocket(socket: WebSocket, state: Arc<GatewayState>, user_id: UserId) {
    let (mut sender, mut receiver) = socket.split();

    let (session, mut events) = SessionHandle::new(user_id.clone(), state.realtime.session_buffer);
    let session_id = session.id;
    let (control_tx, mut control_rx) = mpsc::channel::<ServerEvent>(16);

    info!(session_id = %session_id, user_id = %user_id, "websocket session opened");

    let hello = ServerEvent::Hello {
        session_id: session_id.to_string(),
        user_id: user_id.to_string(),
    };
    if send_event(&mut sender, &hello).await.is_err() {
        return;
    }

    // Replies to this session and fanned-out events share one writer.
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(event) = events.recv() => ServerEvent::from(event),
                Some(reply) = control_rx.recv() => reply,
                else => break,
            };

            if send_event(&mut sender, &event).await.is_err() {
                break;
            }
        }
    });

    let receive_state = state.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let reply = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => handle_client_event(event, &receive_state, &session).await,
                        Err(error) => ServerEvent::Error {
                            error: "invalid_request".to_string(),
                            message: format!("unrecognised event: {error}"),
                        },
                    };

                    if control_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }

    state.chats().broadcaster.leave(session_id).await;
    info!(session_id = %session_id, user_id = %user_id, "websocket session closed");
}

async fn handle_client_event(
    event: ClientEvent,
    state: &GatewayState,
    session: &SessionHandle,
) -> ServerEvent {
    match event {
        ClientEvent::Ping => ServerEvent::Pong,
        ClientEvent::Join { conversation_ids } => {
            let mut accepted = Vec::new();
            let mut rejected = Vec::new();

            for conversation_id in conversation_ids {
                match state
                    .chats()
                    .guard
                    .authorize(&session.user_id, &conversation_id, Access::Read)
                    .await
                {
                    Ok(Decision::Allowed) => accepted.push(conversation_id),
                    Ok(Decision::Denied(_)) => rejected.push(conversation_id),
                    Err(error) => {
                        warn!(
                            session_id = %session.id,
                            conversation_id = %conversation_id,
                            %error,
                            "membership check failed during join"
                        );
                        rejected.push(conversation_id);
                    }
                }
            }

            state.chats().broadcaster.join(session, &accepted).await;
            debug!(
                session_id = %session.id,
                accepted = accepted.len(),
                rejected = rejected.len(),
                "join processed"
            );

            ServerEvent::Joined { accepted, rejected }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_events_parse() {
        let join: ClientEvent =
            serde_json::from_str(r#"{"type":"join","conversation_ids":["c1","c2"]}"#).unwrap();
        match join {
            ClientEvent::Join { conversation_ids } => {
                assert_eq!(conversation_ids, vec![ConversationId::from("c1"), ConversationId::from("c2")]);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let ping: ClientEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ping, ClientEvent::Ping));
    }

    #[test]
    fn test_new_message_event_shape() {
        let event = ServerEvent::NewMessage {
            conversation_id: "c1".to_string(),
            message: MessageResponse {
                id: 7,
                conversation_id: "c1".to_string(),
                sender_id: None,
                is_assistant: true,
                body: "42".to_string(),
                created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "new-message");
        assert_eq!(value["conversation_id"], "c1");
        assert_eq!(value["message"]["id"], 7);
        assert_eq!(value["message"]["is_assistant"], true);
    }
}

//! WebSocket upgrade handler for live story sessions.
//!
//! Connection lifecycle:
//! 1. Validate the session id and upgrade to WebSocket
//! 2. Join the session room and announce `session_ready`
//! 3. Forward room events to the client; dispatch inbound messages as turns
//! 4. Clean up room membership on disconnect
//!
//! Turns run in spawned tasks: a client may send another message while a
//! generation run is still in flight, and the two turns race by design
//! (last snapshot writer wins).

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;

use crate::application::TurnCoordinator;
use crate::domain::foundation::SessionId;
use crate::ports::{ProgressEvent, ProgressPublisher};

use super::messages::{ClientMessage, WireEvent};
use super::rooms::{ClientId, RoomManager};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub rooms: Arc<RoomManager>,
    pub publisher: Arc<dyn ProgressPublisher>,
    pub coordinator: Arc<TurnCoordinator>,
}

impl WebSocketState {
    /// Creates a new WebSocket state.
    pub fn new(
        rooms: Arc<RoomManager>,
        publisher: Arc<dyn ProgressPublisher>,
        coordinator: Arc<TurnCoordinator>,
    ) -> Self {
        Self {
            rooms,
            publisher,
            coordinator,
        }
    }
}

/// Handles WebSocket upgrade requests for a story session.
///
/// Route: `GET /ws/:session_id`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<WebSocketState>,
) -> Response {
    let session_id: SessionId = match session_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "invalid session id").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, session_id: SessionId, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();

    let client_id = ClientId::new();
    let mut room_rx = state.rooms.join(&session_id, client_id.clone()).await;

    state
        .publisher
        .emit(&session_id, ProgressEvent::SessionReady)
        .await;

    // Forward room broadcasts to this client until the room closes or the
    // client goes away.
    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = room_rx.recv().await {
            if send_event(&mut sender, &event).await.is_err() {
                break;
            }
        }
    });

    // Process inbound frames until disconnect.
    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&state, &session_id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong frames are ignored
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session_id, error = %e, "websocket receive error");
                        break;
                    }
                }
            }
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    state.rooms.leave(&client_id).await;
    tracing::debug!(session_id = %session_id, client_id = %client_id, "websocket disconnected");
}

async fn handle_frame(state: &WebSocketState, session_id: &SessionId, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "invalid websocket frame");
            state
                .publisher
                .emit(
                    session_id,
                    ProgressEvent::Error {
                        message: "invalid message format".to_string(),
                    },
                )
                .await;
            return;
        }
    };

    if !message.is_turn_message() {
        tracing::debug!(session_id = %session_id, kind = %message.kind, "ignoring non-turn frame");
        return;
    }

    let coordinator = Arc::clone(&state.coordinator);
    let session_id = session_id.clone();
    tokio::spawn(async move {
        coordinator.handle_turn(session_id, message.theme).await;
    });
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &WireEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event)
        .expect("WireEvent serialization should never fail");
    sender.send(Message::Text(json)).await
}

//! services/api/src/web/ws_handler.rs
//!
//! This is the entry point for a quest WebSocket connection. It pumps frames
//! between the socket and the quest task and tears everything down on close.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    quest_task::quest_process,
    state::{AppState, AuthUser},
};
use alumni_quest_core::routing::{allowed_route, AppRoute};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const INBOX_CAPACITY: usize = 32;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

/// Checks that the user may start a quest. On refusal, returns the message to
/// send before closing the socket.
pub async fn quest_guard(app_state: &AppState, user_id: &str) -> Result<(), ServerMessage> {
    let user = app_state.db.find_user(user_id).await.map_err(|e| {
        error!("Failed to load user {}: {:?}", user_id, e);
        ServerMessage::Error {
            message: "Failed to load your profile.".to_string(),
        }
    })?;

    let route = allowed_route(user.as_ref(), AppRoute::ConnectionQuest);
    if route != AppRoute::ConnectionQuest {
        warn!("User {} redirected to {} before starting a quest.", user_id, route.path());
        return Err(ServerMessage::Error {
            message: format!("Redirect to {}", route.path()),
        });
    }
    Ok(())
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: String) {
    info!("New quest connection established for user: {}", user_id);
    let (mut sender, mut receiver) = socket.split();

    // --- 1. Route guard: quests need a completed profile ---
    if let Err(message) = quest_guard(&app_state, &user_id).await {
        if let Ok(json) = serde_json::to_string(&message) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        let _ = sender.close().await;
        return;
    }

    // --- 2. Wire the quest task to the socket ---
    let (inbox_tx, inbox_rx) = mpsc::channel::<ClientMessage>(INBOX_CAPACITY);
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let cancel = CancellationToken::new();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut quest = tokio::spawn(quest_process(
        app_state.clone(),
        user_id.clone(),
        inbox_rx,
        outbox_tx,
        cancel.clone(),
    ));

    // --- 3. Main loop ---
    let finished = loop {
        tokio::select! {
            result = &mut quest => break Some(result),
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(message) => {
                            if inbox_tx.send(message).await.is_err() {
                                break None;
                            }
                        }
                        Err(e) => warn!("Failed to parse client message: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client for user {} disconnected.", user_id);
                    break None;
                }
                Some(Err(e)) => {
                    warn!("WebSocket error for user {}: {}", user_id, e);
                    break None;
                }
                Some(Ok(_)) => {}
            }
        }
    };

    // --- 4. Cleanup ---
    cancel.cancel();
    let result = match finished {
        Some(result) => result,
        None => quest.await,
    };
    match result {
        Ok(outcome) => info!("Quest for user {} ended: {:?}", user_id, outcome),
        Err(e) => error!("Quest task for user {} failed: {}", user_id, e),
    }
    drop(inbox_tx);
    if let Err(e) = writer.await {
        error!("Quest writer task failed: {}", e);
    }
}

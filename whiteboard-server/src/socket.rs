//! WebSocket transport: hooks connection lifecycle into the engine.
//!
//! Each connection gets a fresh UUID user id. Connect runs `join` and
//! sends the `initialData` snapshot to the new socket only; disconnect
//! runs `leave`. In between, a select loop parses inbound client
//! events and relays fan-out bus events outward.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;
use whiteboard_core::{ClientMessage, ServerMessage};

use crate::metrics;
use crate::validation::{validate_message_size, validate_operation};
use crate::AppState;

/// Serve one client connection until it closes.
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let user_id = Uuid::new_v4().to_string();
    metrics::inc_ws_connections();
    tracing::info!(user_id, "user connected");

    // Subscribe before joining so this socket also sees its own join
    // broadcasts.
    let mut bus_rx = state.engine.subscribe();

    if let Err(err) = state.engine.join(&user_id).await {
        // The user stays connected but unregistered; the next
        // reconciliation of the user list comes from later joins.
        tracing::warn!(user_id, "join dropped: {err}");
    }

    // Full history snapshot for this socket only
    match state.engine.initial_data().await {
        Ok(operations) => {
            let initial = ServerMessage::InitialData { operations };
            if send_message(&mut sender, &initial).await.is_err() {
                finish(&state, &user_id).await;
                return;
            }
        }
        Err(err) => tracing::error!(user_id, "initial data read failed: {err}"),
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&state, &user_id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(user_id, "user disconnected");
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::error!(user_id, "websocket error: {err}");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            event = bus_rx.recv() => {
                match event {
                    Ok(message) => {
                        if send_message(&mut sender, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Skipped events are healed by the periodic update
                        tracing::warn!(user_id, "socket lagged behind by {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("fan-out channel closed");
                        break;
                    }
                }
            }
        }
    }

    finish(&state, &user_id).await;
}

/// Parse and dispatch one inbound text frame. Failures are logged and
/// dropped; the client sees no explicit error, only a missing effect.
async fn handle_text(state: &AppState, user_id: &str, text: &str) {
    if let Err(err) = validate_message_size(text.len()) {
        metrics::record_validation_failure(err.label());
        tracing::warn!(user_id, "message rejected: {err}");
        return;
    }

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Draw { op }) => {
            if let Err(err) = validate_operation(&op) {
                metrics::record_validation_failure(err.label());
                tracing::warn!(user_id, "draw rejected: {err}");
                return;
            }
            if let Err(err) = state.engine.submit_draw(op).await {
                tracing::info!(user_id, "draw dropped: {err}");
            }
        }
        Ok(ClientMessage::ClearCanvas) => {
            tracing::info!(user_id, "clearCanvas received");
            if let Err(err) = state.engine.clear().await {
                tracing::info!(user_id, "clear dropped: {err}");
            }
        }
        Err(err) => {
            tracing::warn!(user_id, "unparseable client message: {err}");
        }
    }
}

async fn send_message(
    sender: &mut (impl SinkExt<Message> + Unpin),
    message: &ServerMessage,
) -> Result<(), ()> {
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.map_err(|_| ()),
        Err(err) => {
            tracing::error!("failed to serialize {}: {err}", message.event_name());
            Ok(())
        }
    }
}

/// Deregister on the way out.
async fn finish(state: &AppState, user_id: &str) {
    if let Err(err) = state.engine.leave(user_id).await {
        tracing::warn!(user_id, "leave dropped: {err}");
    }
    metrics::dec_ws_connections();
    tracing::info!(user_id, "connection closed");
}

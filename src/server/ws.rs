//! Per-connection WebSocket loop.
//!
//! Each connection gets an id from a process-wide counter and an
//! unbounded outbound queue. One `select!` loop forwards queued server
//! messages to the socket and decodes incoming frames into actions for
//! the hub. When the socket closes the connection's player is removed
//! immediately; there is no reconnection by identity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::server::hub::{OutboundTx, RoomHub};
use crate::state::player::ConnectionId;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub async fn ws_handler(
    State(hub): State<Arc<RoomHub>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(mut socket: WebSocket, hub: Arc<RoomHub>) {
    let conn = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Room this connection has joined, canonical code.
    let mut joined: Option<String> = None;

    tracing::debug!(conn, "connection opened");

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(_) => continue,
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let msg: ClientMessage = match serde_json::from_str(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                let _ = tx.send(ServerMessage::Error {
                                    message: format!("Invalid message: {e}"),
                                });
                                continue;
                            }
                        };
                        dispatch(&hub, conn, &tx, &mut joined, msg).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(conn, "websocket read error: {e}");
                        break;
                    }
                }
            }
        }
    }

    if let Some(code) = joined {
        hub.disconnect(&code, conn).await;
    }
    tracing::debug!(conn, "connection closed");
}

/// Route one decoded action to the hub; rejections go back to the acting
/// connection only.
async fn dispatch(
    hub: &RoomHub,
    conn: ConnectionId,
    tx: &OutboundTx,
    joined: &mut Option<String>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Join { room_id, name } => {
            if joined.is_some() {
                let _ = tx.send(ServerMessage::Error {
                    message: "Already in a room.".to_string(),
                });
                return;
            }
            match hub.join(&room_id, conn, &name, tx.clone()).await {
                Ok(canonical) => *joined = Some(canonical),
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
        ClientMessage::Start { room_id } => {
            if let Err(e) = hub.start(&room_id, conn).await {
                let _ = tx.send(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }
        ClientMessage::Roll { room_id } => {
            if let Err(e) = hub.roll(&room_id, conn).await {
                let _ = tx.send(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }
    }
}

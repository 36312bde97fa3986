//! WebSocket endpoint. Each socket gets one task that pumps frames in both
//! directions; all game logic happens in the room's actor.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::actor::SessionEvent;
use crate::manager::SessionManager;
use crate::protocol::{ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Room code to attach to
    pub room: String,
    /// Connection id from an earlier welcome, to reclaim that seat
    pub rejoin: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(manager): State<Arc<SessionManager>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: room={}, rejoin={:?}",
        params.room,
        params.rejoin
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, manager))
}

async fn handle_socket(socket: WebSocket, params: WsQuery, manager: Arc<SessionManager>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(events) = manager.room_events(&params.room).await else {
        tracing::info!("Rejected socket for unknown room {}", params.room);
        let error = ServerMessage::Error {
            code: "UNKNOWN_ROOM".to_string(),
            msg: format!("No room with code {}", params.room),
        };
        if let Ok(json) = serde_json::to_string(&error) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        let _ = sender.close().await;
        return;
    };

    let (connection_id, rejoin) = match params.rejoin {
        Some(id) => (id, true),
        None => (ulid::Ulid::new().to_string(), false),
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let attach = SessionEvent::Connect {
        connection_id: connection_id.clone(),
        rejoin,
        sender: outbound_tx.clone(),
    };
    if events.send(attach).is_err() {
        // The room wound down between lookup and attach
        let _ = sender.close().await;
        return;
    }

    // True only when the client sent a clean close frame; anything else
    // counts as an unexpected drop and keeps the seat reclaimable
    let mut consented = false;

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(message) => {
                        if let Ok(json) = serde_json::to_string(&message) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    // The session refused us or shut down
                    None => break,
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => {
                                let event = SessionEvent::Message {
                                    connection_id: connection_id.clone(),
                                    message,
                                };
                                if events.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                // Malformed frames are dropped, not fatal
                                tracing::debug!(
                                    "Unparseable message from {}: {}",
                                    connection_id,
                                    e
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        consented = true;
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    let _ = events.send(SessionEvent::Disconnect {
        connection_id: connection_id.clone(),
        consented,
        sender: outbound_tx,
    });
    let _ = sender.close().await;
    tracing::info!(
        "WebSocket closed for {} (consented: {})",
        connection_id,
        consented
    );
}

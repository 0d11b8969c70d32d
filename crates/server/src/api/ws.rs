//! WebSocket endpoint carrying index commands and notifications.
//!
//! Clients send `index_repacks` and `search` commands; the server pushes
//! build notifications to every client and answers each search on the
//! socket that asked for it.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use repackhub_core::{IndexEvent, IndexStats, RepackIndexHandle, SearchResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Outbound queue size per connection.
const OUTBOUND_BUFFER: usize = 32;

/// How long a closing connection may spend flushing queued frames.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Command sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    /// Rebuild the index; completion arrives as `indexing_complete`.
    IndexRepacks,
    Search {
        request_id: String,
        #[serde(default)]
        query: String,
    },
}

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// The index was rebuilt and is ready for searches.
    IndexingComplete { stats: IndexStats },
    /// A rebuild failed; the previous index is still being served.
    IndexingFailed { error: String },
    /// Answer to one `search` command.
    SearchResult {
        request_id: String,
        results: Vec<SearchResult>,
    },
    /// A command could not be served.
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        error: String,
    },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::IndexingComplete { .. } => "indexing_complete",
            WsMessage::IndexingFailed { .. } => "indexing_failed",
            WsMessage::SearchResult { .. } => "search_result",
            WsMessage::Error { .. } => "error",
        }
    }
}

impl From<IndexEvent> for WsMessage {
    fn from(event: IndexEvent) -> Self {
        match event {
            IndexEvent::IndexingComplete { stats } => WsMessage::IndexingComplete { stats },
            IndexEvent::IndexingFailed { error } => WsMessage::IndexingFailed { error },
        }
    }
}

/// Serve one client command. Returns the direct reply, if the command has one.
pub async fn handle_command(index: &RepackIndexHandle, text: &str) -> Option<WsMessage> {
    let command = match serde_json::from_str::<WsCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            return Some(WsMessage::Error {
                request_id: None,
                error: format!("Invalid command: {}", e),
            })
        }
    };

    match command {
        WsCommand::IndexRepacks => match index.request_index().await {
            Ok(()) => None,
            Err(e) => Some(WsMessage::Error {
                request_id: None,
                error: e.to_string(),
            }),
        },
        WsCommand::Search { request_id, query } => {
            match index.search(request_id.clone(), query).await {
                Ok(response) => Some(WsMessage::SearchResult {
                    request_id: response.request_id,
                    results: response.results,
                }),
                Err(e) => Some(WsMessage::Error {
                    request_id: Some(request_id),
                    error: e.to_string(),
                }),
            }
        }
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Resolves once the server has begun shutting down.
async fn server_stopping(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<WsMessage>(OUTBOUND_BUFFER);

    // Subscribe before reading any command so no notification is missed.
    let mut events = state.index().subscribe();
    let mut shutdown = state.shutdown_listener();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    let event_tx = out_tx.clone();
    let event_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if event_tx.send(WsMessage::from(event)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} notifications", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Index notification channel closed");
                    break;
                }
            }
        }
    });

    // Drains queued frames, then closes the socket once every producer is gone.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        return;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize WsMessage: {}", e);
                }
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Commands are served in the order the client sent them.
    loop {
        tokio::select! {
            next = receiver.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_command(state.index(), text.as_str()).await {
                        if out_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client closed the connection");
                    break;
                }
                Some(Ok(Message::Ping(data))) => {
                    // Pong is handled automatically by axum
                    debug!("Received ping: {:?}", data);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            },
            _ = server_stopping(&mut shutdown) => {
                debug!("Server shutting down, closing WebSocket");
                break;
            }
        }
    }

    // Clean up
    event_task.abort();
    let _ = event_task.await;
    drop(out_tx);
    if timeout(CLOSE_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }
    drop(state);
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

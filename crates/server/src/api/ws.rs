//! WebSocket stream of status lines and run events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use picgrab_core::{RunSummary, StatusLevel, StatusReporter, TracingReporter};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// One status line from the active run.
    Status {
        level: StatusLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// A run was started.
    RunStarted { run_id: Uuid },
    /// A run ended, with either a summary or an error.
    RunFinished {
        run_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<RunSummary>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::Status { .. } => "status",
            WsMessage::RunStarted { .. } => "run_started",
            WsMessage::RunFinished { .. } => "run_finished",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers just means nobody is watching.
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn status(&self, level: StatusLevel, message: &str) {
        self.broadcast(WsMessage::Status {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn run_started(&self, run_id: Uuid) {
        self.broadcast(WsMessage::RunStarted { run_id });
    }

    pub fn run_finished(&self, run_id: Uuid, summary: Option<&RunSummary>, error: Option<String>) {
        self.broadcast(WsMessage::RunFinished {
            run_id,
            summary: summary.cloned(),
            error,
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Status reporter that logs through tracing and fans out to WebSocket
/// clients.
#[derive(Debug, Clone)]
pub struct BroadcastReporter {
    broadcaster: WsBroadcaster,
    log: TracingReporter,
}

impl BroadcastReporter {
    pub fn new(broadcaster: WsBroadcaster) -> Self {
        Self {
            broadcaster,
            log: TracingReporter::new(),
        }
    }
}

impl StatusReporter for BroadcastReporter {
    fn report(&self, level: StatusLevel, message: &str) {
        self.log.report(level, message);
        self.broadcaster.status(level, message);
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only ever close; anything else is logged and ignored.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

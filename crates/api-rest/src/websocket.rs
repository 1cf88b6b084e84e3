//! WebSocket stream of relayed notifications.
//!
//! Clients connect to `/ws/notifications` and receive JSON frames tagged by `type`:
//! - `notification`: a notification delivered to the relay (local or from another context)
//! - `heartbeat`: sent every 30 seconds with the server time
//! - `error`: e.g. `MESSAGES_DROPPED` when the client fell behind
//!
//! Client messages are ignored apart from `Close`.

use std::time::Duration;

use api_shared::StreamMessage;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{Sink, SinkExt, StreamExt};
use resq_core::Notification;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};

use crate::state::AppState;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

#[utoipa::path(
    get,
    path = "/ws/notifications",
    responses(
        (status = 101, description = "WebSocket connection established")
    )
)]
pub async fn ws_notifications(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let notifications = state.subscribe();
    tracing::debug!("notification stream client connected");

    let forward_task = tokio::spawn(forward(sender, notifications, HEARTBEAT_PERIOD));

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Close(_) => break,
            _ => tracing::trace!("ignoring client message"),
        }
    }

    forward_task.abort();
    tracing::debug!("notification stream client disconnected");
}

/// Writes notification and heartbeat frames to `sender` until the client goes away or the
/// notification channel closes.
async fn forward<S>(
    mut sender: S,
    mut notifications: broadcast::Receiver<Notification>,
    heartbeat_period: Duration,
) where
    S: Sink<Message> + Unpin,
{
    let mut heartbeat = interval_at(Instant::now() + heartbeat_period, heartbeat_period);
    loop {
        let frame = tokio::select! {
            result = notifications.recv() => match result {
                Ok(notification) => StreamMessage::Notification { notification },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "WebSocket client lagged, notifications dropped");
                    StreamMessage::Error {
                        code: "MESSAGES_DROPPED".to_string(),
                        message: format!("{n} notifications were dropped due to slow client"),
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = heartbeat.tick() => StreamMessage::Heartbeat { timestamp: Utc::now() },
        };

        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to encode stream frame: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live pipeline view streaming for operator UIs.
//!
//! Each connected client receives the pipeline view whenever the coordinator
//! publishes a new one: a fresh snapshot, a failed fetch, a period switch or
//! a stage panel toggle.
//!
//! # Architecture
//!
//! - Views come from the coordinator's watch channel; slow clients skip
//!   intermediate views and always see the latest one
//! - No commands are executed over WebSocket connections
//! - Clients still use the HTTP API to select periods and run audits

use crate::AppState;
use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use residuals::PipelineView;
use residuals_api::PipelineViewResponse;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Live stream event types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server timestamp (ISO 8601).
        timestamp: String,
    },
    /// The pipeline view changed.
    Pipeline {
        /// The latest view.
        view: Box<PipelineViewResponse>,
    },
}

impl LiveEvent {
    fn connected() -> Self {
        Self::Connected {
            timestamp: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Iso8601::DEFAULT)
                .unwrap_or_else(|_| String::from("unknown")),
        }
    }

    fn pipeline(view: &PipelineView) -> Self {
        Self::Pipeline {
            view: Box::new(view.into()),
        }
    }

    fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                error!(?e, "Failed to serialize live event");
                None
            }
        }
    }
}

/// Waits for the next published view.
///
/// Returns `None` once the coordinator has gone away.
async fn next_event(views: &mut watch::Receiver<PipelineView>) -> Option<LiveEvent> {
    views.changed().await.ok()?;
    let view: PipelineView = views.borrow_and_update().clone();
    Some(LiveEvent::pipeline(&view))
}

/// Handles WebSocket upgrade requests for live pipeline streaming.
///
/// # Arguments
///
/// * `ws` - WebSocket upgrade request
/// * `app_state` - Application state holding the coordinator
///
/// # Returns
///
/// An HTTP response that upgrades the connection to WebSocket
pub async fn live_pipeline_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    let views: watch::Receiver<PipelineView> = app_state.coordinator.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, views))
}

/// Handles an individual WebSocket connection.
///
/// Sends a connection confirmation and the current view, then streams every
/// later view until the client disconnects or an error occurs.
async fn handle_socket(socket: WebSocket, mut views: watch::Receiver<PipelineView>) {
    info!("Client connected to live pipeline stream");

    let (mut sender, mut receiver) = socket.split();

    let current: PipelineView = views.borrow_and_update().clone();
    for event in [LiveEvent::connected(), LiveEvent::pipeline(&current)] {
        if let Some(message) = event.to_message()
            && sender.send(message).await.is_err()
        {
            warn!("Failed to send initial live events");
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut views).await {
            if let Some(message) = event.to_message()
                && sender.send(message).await.is_err()
            {
                // Client disconnected
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live pipeline stream");
}

//! WebSocket stock feed.
//!
//! Subscribers receive a JSON event after every ledger mutation:
//! `{"medicine_id": "...", "movement_type": "stock_out", "quantity": 5,
//!   "current_stock": 65, "at": "..."}`. Delivery is best-effort — the
//! ledger commits regardless of subscriber state, and a lagging subscriber
//! simply skips ahead.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Extension;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::api::types::ApiContext;
use crate::models::enums::MovementType;
use crate::scope::ScopeDescriptor;

/// One ledger mutation, as seen by feed subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEvent {
    pub medicine_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub current_stock: i64,
    pub at: DateTime<Utc>,
}

impl StockEvent {
    pub fn new(medicine_id: Uuid, movement_type: MovementType, quantity: i64, balance: i64) -> Self {
        Self {
            medicine_id,
            movement_type,
            quantity,
            current_stock: balance,
            at: Utc::now(),
        }
    }
}

/// `GET /api/v1/ws/stock` — upgrade to the stock feed. Requires a valid
/// bearer session (the auth middleware runs before the upgrade).
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> impl IntoResponse {
    tracing::info!(user_id = %scope.user_id, "stock feed subscriber connected");
    let rx = ctx.stock_tx.subscribe();
    ws.on_upgrade(move |socket| run_feed(socket, rx))
}

async fn run_feed(socket: WebSocket, mut rx: tokio::sync::broadcast::Receiver<StockEvent>) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    // Skipped events are acceptable; only a closed channel ends the feed
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "stock feed subscriber lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // The feed is one-way; everything else is ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("stock feed subscriber disconnected");
}

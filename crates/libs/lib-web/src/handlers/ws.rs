//! # Balance WebSocket
//!
//! Live balance updates for the authenticated user.
//!
//! ## Endpoints
//!
//! - `GET /api/ws/balance?token=<jwt>` - WebSocket connection that pushes a
//!   JSON [`BalanceEvent`] whenever the user's balance changes
//!
//! Browsers cannot set headers on WebSocket upgrades, so the JWT rides in
//! the query string instead of `Authorization`. Events for other users are
//! filtered out before sending.

use crate::services::BalanceFeed;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use lib_auth::decode_jwt;
use lib_core::config::core_config;
use lib_core::dto::BalanceEvent;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// WebSocket handler for the balance feed.
pub async fn balance_websocket(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(feed): State<BalanceFeed>,
) -> Response {
    let config = core_config();
    let claims = match decode_jwt(&query.token, &config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("[WS] Balance feed auth failed: {}", e);
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => {
            warn!("[WS] Bad subject in token: {}", e);
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    info!(user_id, username = %claims.username, "[WS] Balance feed connect");

    let rx = feed.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, user_id))
}

async fn handle_socket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<BalanceEvent>,
    user_id: i64,
) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) if event.user_id == user_id => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(user_id, "[WS] Event serialization failed: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            debug!(user_id, "[WS] Client gone, closing");
                            break;
                        }
                    }
                    Ok(_) => {} // another user's event
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Client fell behind; it should re-read the balance endpoint
                        warn!(user_id, skipped, "[WS] Balance feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(user_id, "[WS] Feed closed");
                        break;
                    }
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        info!(user_id, "[WS] Balance feed disconnect");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(_)) => {} // ignore client chatter
                    Some(Err(e)) => {
                        debug!(user_id, "[WS] Socket error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}

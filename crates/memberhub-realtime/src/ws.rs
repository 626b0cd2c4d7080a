//! WebSocket upgrade endpoint and per-socket task.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::time::{Instant, interval_at};
use tracing::{info, warn};

use crate::connection::authenticator::{ChannelAuthenticator, ChannelIdentity};
use crate::event::ServerEvent;
use crate::server::RealtimeEngine;

/// State shared by the WebSocket routes.
#[derive(Clone)]
pub struct WsState {
    pub engine: RealtimeEngine,
    pub authenticator: Arc<dyn ChannelAuthenticator>,
}

/// Builds the realtime router: `GET /ws?token={jwt}` plus a liveness probe.
pub fn router(state: WsState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Query parameters for the upgrade request.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Channel access token.
    pub token: String,
}

/// Authenticates the query token, then hands the socket to [`run_channel`].
/// A bad token is a 401 before any upgrade happens.
async fn ws_handler(
    State(state): State<WsState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Response {
    match state.authenticator.authenticate(&query.token).await {
        Ok(identity) => ws.on_upgrade(move |socket| run_channel(state, identity, socket)),
        Err(e) => {
            warn!(error = %e, "Rejected WebSocket upgrade");
            (StatusCode::UNAUTHORIZED, "invalid token").into_response()
        }
    }
}

/// Drives one established socket until the peer leaves, the channel dies,
/// or the engine shuts down.
async fn run_channel(state: WsState, identity: ChannelIdentity, socket: WebSocket) {
    let sessions = state.engine.sessions();
    let (handle, mut outbound_rx) = match sessions.register(identity.user_id) {
        Ok(pair) => pair,
        Err(e) => {
            warn!(user_id = %identity.user_id, error = %e, "Refused channel registration");
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let channel_id = handle.id;
    info!(
        channel_id = %channel_id,
        user_id = %identity.user_id,
        username = %identity.username,
        "WebSocket channel established"
    );

    let (mut sink, mut stream) = socket.split();

    // Drain the outbound queue into the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut shutdown = state.engine.shutdown_receiver();
    let ping_period = Duration::from_secs(state.engine.config().ping_interval_seconds.max(1));
    let publish_timeout = Duration::from_millis(state.engine.config().publish_timeout_ms);
    let mut ping = interval_at(Instant::now() + ping_period, ping_period);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ping.tick() => {
                let probe = ServerEvent::Ping { timestamp: Utc::now().timestamp_millis() };
                if !send_event(&handle, &probe, publish_timeout).await {
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = sessions.handle_client_message(&handle, text.as_str()).await
                        && !send_event(&handle, &reply, publish_timeout).await
                    {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Protocol-level pings are answered by axum itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(channel_id = %channel_id, error = %e, "WebSocket read error");
                    break;
                }
            }
        }
    }

    writer.abort();
    sessions.unregister(channel_id);

    info!(
        channel_id = %channel_id,
        user_id = %identity.user_id,
        "WebSocket channel closed"
    );
}

async fn send_event(
    handle: &crate::connection::handle::ChannelHandle,
    event: &ServerEvent,
    timeout: Duration,
) -> bool {
    match serde_json::to_string(event) {
        Ok(frame) => handle.send(frame, timeout).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize reply frame");
            true
        }
    }
}

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::SignalingConfig;

use super::protocol::SignalMessage;
use super::session::{PeerRole, SessionRegistry};

#[derive(Clone)]
pub struct SignalingState {
    pub registry: Arc<SessionRegistry>,
    pub config: SignalingConfig,
}

/// WebSocket endpoints pairing the two sides of an interview call, plus the
/// on-demand fallback trigger.
pub fn signaling_router(state: SignalingState) -> Router {
    Router::new()
        .route("/ws/video/:application_id/hr", get(hr_socket_handler))
        .route(
            "/ws/video/:application_id/candidate",
            get(candidate_socket_handler),
        )
        .route(
            "/api/v1/video/:application_id/fallback",
            post(fallback_handler),
        )
        .with_state(state)
}

async fn hr_socket_handler(
    State(state): State<SignalingState>,
    Path(application_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| peer_loop(state, application_id, PeerRole::Hr, socket))
}

async fn candidate_socket_handler(
    State(state): State<SignalingState>,
    Path(application_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| peer_loop(state, application_id, PeerRole::Candidate, socket))
}

pub(crate) async fn fallback_handler(
    State(state): State<SignalingState>,
    Path(application_id): Path<String>,
) -> Json<serde_json::Value> {
    let url = state.registry.trigger_fallback(&application_id);
    Json(json!({ "url": url }))
}

/// One connection's lifetime: register with the session, pump outbound
/// messages into the socket, keep the socket alive with periodic pings, and
/// feed inbound frames back into the registry until the peer goes away.
async fn peer_loop(state: SignalingState, application_id: String, role: PeerRole, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (sender, mut outbound) = mpsc::unbounded_channel();

    state.registry.connect(&application_id, role, sender.clone());

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let Ok(text) = serde_json::to_string(&message) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let keepalive_sender = sender;
    let keepalive_every = state.config.keepalive_interval();
    let keepalive = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(keepalive_every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if keepalive_sender.send(SignalMessage::Ping).is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<SignalMessage>(&text) {
                Ok(message) => state.registry.handle_message(&application_id, role, message),
                Err(err) => {
                    debug!(%application_id, role = role.label(), error = %err, "ignoring unparseable frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(%application_id, role = role.label(), error = %err, "socket error");
                break;
            }
        }
    }

    state.registry.disconnect(&application_id, role);
    keepalive.abort();
    writer.abort();
}

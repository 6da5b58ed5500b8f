//! WebSocket upgrade handler and per-connection lifecycle
//!
//! `Connecting` validates the identity and registers the session,
//! `Active` pumps frames into [`dispatch`](super::dispatch), and `Closed`
//! always releases the identity and rebroadcasts, whichever path ended it.

use std::borrow::Cow;
use std::fmt::Display;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::proximity::broadcast_user_lists;
use crate::session::{Outbound, RegistryError, Transport};
use crate::util::rate_limit::ControlRateLimiter;
use crate::ws::dispatch::{handle_binary, handle_text};
use crate::ws::protocol::ServerMsg;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<Vec<(String, String)>>,
    State(state): State<AppState>,
) -> Response {
    let username = first_username(params);
    // Rejections are reported as close frames, so always upgrade
    ws.on_upgrade(move |socket| handle_socket(socket, username, state))
}

/// First `username` query value; repeats are ignored
fn first_username(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, _)| key == "username")
        .map(|(_, value)| value)
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, username: Option<String>, state: AppState) {
    let (mut ws_sink, ws_stream) = socket.split();

    let Some(identity) = username.filter(|u| !u.trim().is_empty()) else {
        warn!("Connection without username rejected");
        close_with(&mut ws_sink, close_code::POLICY, "Username is required").await;
        return;
    };

    let (transport, outbound_rx) = Transport::channel(state.config.send_queue_capacity);
    let conn_id = transport.id();

    // Queued before registration, so it precedes any broadcast
    let welcome = ServerMsg::PlayerList {
        players: state.player_names.snapshot(),
    };
    match Outbound::json(&welcome) {
        Ok(msg) => {
            if let Err(e) = transport.send(msg) {
                debug!(identity = %identity, error = %e, "Player list not queued");
            }
        }
        Err(e) => error!(identity = %identity, error = %e, "Failed to encode player list"),
    }

    let guard = match ActiveSession::register(&state, &identity, transport) {
        Ok(guard) => guard,
        Err(RegistryError::DuplicateIdentity(_)) => {
            warn!(identity = %identity, "Duplicate identity rejected");
            close_with(&mut ws_sink, close_code::POLICY, "Username already connected").await;
            return;
        }
        Err(e) => {
            warn!(identity = %identity, error = %e, "Connection rejected");
            close_with(&mut ws_sink, close_code::POLICY, "Username is required").await;
            return;
        }
    };

    info!(identity = %identity, conn_id = %conn_id, "Session connected");
    broadcast_user_lists(&state.registry, &state.engine);

    let mut writer_handle = tokio::spawn(write_outbound(
        ws_sink,
        outbound_rx,
        identity.clone(),
        state.config.send_timeout,
    ));

    // Either side ending closes the session
    tokio::select! {
        _ = read_inbound(&state, &identity, ws_stream) => {}
        _ = &mut writer_handle => {
            debug!(identity = %identity, "Writer stopped, closing session");
        }
    }

    // Closed: drop unregisters and rebroadcasts
    drop(guard);
    writer_handle.abort();

    info!(identity = %identity, conn_id = %conn_id, "Session disconnected");
}

/// Reader loop: WebSocket -> dispatch
async fn read_inbound(state: &AppState, identity: &str, mut ws_stream: SplitStream<WebSocket>) {
    let rate_limiter = ControlRateLimiter::new(state.config.control_rate_limit);

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check() {
                    warn!(identity = %identity, "Rate limited control message");
                    continue;
                }
                handle_text(state, identity, &text);
            }
            Ok(Message::Binary(data)) => {
                handle_binary(state, identity, Bytes::from(data));
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(identity = %identity, "Client initiated close");
                break;
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "WebSocket error");
                break;
            }
        }
    }
}

/// Writer loop: session queue -> WebSocket. Each write is bounded by
/// `send_timeout`; a peer that stops reading ends the loop.
async fn write_outbound<S>(
    mut ws_sink: S,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    identity: String,
    send_timeout: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(outbound) = outbound_rx.recv().await {
        let msg = match outbound {
            Outbound::Text(text) => Message::Text(text),
            Outbound::Binary(bytes) => Message::Binary(bytes.to_vec()),
        };

        match timeout(send_timeout, ws_sink.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(identity = %identity, error = %e, "WebSocket send failed");
                break;
            }
            Err(_) => {
                warn!(
                    identity = %identity,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "WebSocket send timed out, dropping peer"
                );
                break;
            }
        }
    }
}

async fn close_with(
    ws_sink: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: impl Into<Cow<'static, str>>,
) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = ws_sink.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Failed to send close frame");
    }
}

/// Registration held for the `Active` state; dropping it is the `Closed`
/// transition
struct ActiveSession {
    state: AppState,
    identity: String,
}

impl ActiveSession {
    fn register(state: &AppState, identity: &str, transport: Transport) -> Result<Self, RegistryError> {
        state.registry.register(identity, transport)?;
        Ok(Self {
            state: state.clone(),
            identity: identity.to_string(),
        })
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.state.registry.unregister(&self.identity);
        broadcast_user_lists(&self.state.registry, &self.state.engine);
    }
}

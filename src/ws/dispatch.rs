//! Inbound frame dispatch for an active session

use bytes::Bytes;
use tracing::warn;

use crate::app::AppState;
use crate::audio::RelayReport;
use crate::proximity::{broadcast_user_lists, BroadcastReport};

use super::protocol::{parse_client_msg, ClientMsg};

/// What happened to one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Position stored and new nearby sets pushed to everyone
    PositionApplied(BroadcastReport),
    /// Text frame was malformed, unrecognized or rejected by validation
    Dropped,
    /// Binary frame fanned out to nearby sessions
    Relayed(RelayReport),
}

/// Handle a text (control) frame from `identity`
pub fn handle_text(state: &AppState, identity: &str, text: &str) -> Dispatch {
    let msg = match parse_client_msg(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(identity = %identity, error = %e, "Dropping client message");
            return Dispatch::Dropped;
        }
    };

    match msg {
        ClientMsg::SetPosition { position } => {
            if state.registry.update_position(identity, position) {
                Dispatch::PositionApplied(broadcast_user_lists(&state.registry, &state.engine))
            } else {
                Dispatch::Dropped
            }
        }
    }
}

/// Handle a binary (audio) frame from `identity`
pub fn handle_binary(state: &AppState, identity: &str, frame: Bytes) -> Dispatch {
    Dispatch::Relayed(state.relay.relay(&state.registry, identity, frame))
}

//! WebSocket protocol message definitions
//! Text frames carry JSON; binary frames carry opaque audio

use serde::{Deserialize, Serialize};

use crate::proximity::{NearbyEntry, Position};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Client-reported position
    SetPosition { position: Position },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Known population, sent once on connect
    PlayerList { players: Vec<String> },

    /// Sessions currently in earshot of the recipient
    UserList { users: Vec<NearbyEntry> },
}

/// Inbound text that cannot be applied
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized message type: {0}")]
    Unrecognized(String),

    #[error("malformed {kind} message: {source}")]
    Malformed {
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// Parse an inbound text frame
pub fn parse_client_msg(text: &str) -> Result<ClientMsg, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    match value.get("type").and_then(|t| t.as_str()) {
        Some("setPosition") => serde_json::from_value(value).map_err(|source| ProtocolError::Malformed {
            kind: "setPosition",
            source,
        }),
        Some(other) => Err(ProtocolError::Unrecognized(other.to_string())),
        None => Err(ProtocolError::Unrecognized("<missing>".to_string())),
    }
}

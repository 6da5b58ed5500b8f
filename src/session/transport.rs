//! Outbound transport handle for a connected session

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Message queued for a session's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Binary(Bytes),
}

impl Outbound {
    /// Serialize a protocol message into a text frame
    pub fn json<T: Serialize>(msg: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(msg).map(Outbound::Text)
    }
}

/// Cloneable send handle backed by a bounded queue.
///
/// Sends never wait: a full queue drops the message, matching the
/// best-effort delivery of positions and audio.
#[derive(Debug, Clone)]
pub struct Transport {
    id: Uuid,
    tx: mpsc::Sender<Outbound>,
}

impl Transport {
    /// Create a transport and the receiver its writer task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    /// Connection id, for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send(&self, msg: Outbound) -> Result<(), SendError> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Recipient could not accept a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("transport closed")]
    Closed,

    #[error("send queue full")]
    Full,
}

//! Live session registry keyed by identity

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::proximity::Position;

use super::transport::Transport;

/// Server-side record of one connected participant
#[derive(Debug, Clone)]
pub struct Session {
    identity: String,
    pub position: Position,
    pub transport: Transport,
}

impl Session {
    fn new(identity: String, transport: Transport) -> Self {
        Self {
            identity,
            position: Position::ORIGIN,
            transport,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Point-in-time copy of every session, taken under the registry lock
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    sessions: Vec<Session>,
}

impl RegistrySnapshot {
    pub fn get(&self, identity: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.identity == identity)
    }

    pub fn position_of(&self, identity: &str) -> Option<Position> {
        self.get(identity).map(|s| s.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }
}

/// All live sessions. Every read-modify-write happens under one lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session at the origin. Identity is a unique key.
    pub fn register(&self, identity: &str, transport: Transport) -> Result<Session, RegistryError> {
        if identity.trim().is_empty() {
            return Err(RegistryError::EmptyIdentity);
        }

        let mut sessions = self.sessions.write();
        if sessions.contains_key(identity) {
            return Err(RegistryError::DuplicateIdentity(identity.to_string()));
        }

        let session = Session::new(identity.to_string(), transport);
        sessions.insert(identity.to_string(), session.clone());
        debug!(identity = %identity, total = sessions.len(), "Session registered");
        Ok(session)
    }

    /// Remove a session; returns whether one was present
    pub fn unregister(&self, identity: &str) -> bool {
        let removed = self.sessions.write().remove(identity).is_some();
        if removed {
            debug!(identity = %identity, "Session unregistered");
        }
        removed
    }

    /// Replace a session's stored position
    pub fn update_position(&self, identity: &str, position: Position) -> bool {
        if let Err(e) = position.validate() {
            warn!(identity = %identity, error = %e, ?position, "Rejected position update");
            return false;
        }

        match self.sessions.write().get_mut(identity) {
            Some(session) => {
                session.position = position;
                true
            }
            None => {
                warn!(identity = %identity, "Position update for unknown session");
                false
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<Session> {
        self.sessions.read().get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.read().contains_key(identity)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            sessions: self.sessions.read().values().cloned().collect(),
        }
    }

    pub fn identities(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

/// Handshake-time registration failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("identity must not be empty")]
    EmptyIdentity,

    #[error("identity '{0}' is already connected")]
    DuplicateIdentity(String),
}

//! Proximity-scoped audio fan-out

use std::str::FromStr;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::proximity::ProximityEngine;
use crate::session::{Outbound, SessionRegistry};

use super::frame::{rewrite_volume, FrameFormat};

/// How loudness reaches the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioMode {
    /// Scale samples per recipient by their computed volume
    #[default]
    Rewrite,
    /// Forward frames untouched; clients attenuate from `userList`
    Passthrough,
}

impl FromStr for AudioMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rewrite" => Ok(Self::Rewrite),
            "passthrough" => Ok(Self::Passthrough),
            other => Err(format!("unknown audio mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioSettings {
    pub mode: AudioMode,
    pub format: FrameFormat,
}

/// Outcome of relaying one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub delivered: usize,
    pub unreachable: usize,
    /// Nearby entries whose session vanished before the send
    pub skipped: usize,
    /// True when the sender itself was not registered
    pub dropped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AudioRelay {
    engine: ProximityEngine,
    settings: AudioSettings,
}

impl AudioRelay {
    pub fn new(engine: ProximityEngine, settings: AudioSettings) -> Self {
        Self { engine, settings }
    }

    /// Forward `frame` from `sender` to every session within range
    pub fn relay(&self, registry: &SessionRegistry, sender: &str, frame: Bytes) -> RelayReport {
        let mut report = RelayReport::default();
        let snapshot = registry.snapshot();

        if snapshot.get(sender).is_none() {
            warn!(identity = %sender, "Dropping audio from unregistered sender");
            report.dropped = true;
            return report;
        }

        let rewrite = match self.settings.mode {
            AudioMode::Rewrite if self.settings.format.recognizes(&frame) => true,
            AudioMode::Rewrite => {
                debug!(identity = %sender, bytes = frame.len(), "Unrecognized audio container, passing through");
                false
            }
            AudioMode::Passthrough => false,
        };

        for entry in self.engine.nearby_in(&snapshot, sender) {
            let Some(recipient) = registry.get(&entry.username) else {
                debug!(identity = %entry.username, "Recipient left before audio send");
                report.skipped += 1;
                continue;
            };

            let payload = if rewrite {
                rewrite_volume(&frame, entry.volume, &self.settings.format)
                    .unwrap_or_else(|_| frame.clone())
            } else {
                frame.clone()
            };

            match recipient.transport.send(Outbound::Binary(payload)) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!(identity = %entry.username, error = %e, "Audio frame not delivered");
                    report.unreachable += 1;
                }
            }
        }

        trace!(
            identity = %sender,
            bytes = frame.len(),
            delivered = report.delivered,
            unreachable = report.unreachable,
            "Relayed audio frame"
        );
        report
    }
}

//! Proximity model: positions, distance, attenuation and nearby-set queries

pub mod broadcast;
pub mod engine;
pub mod volume;

pub use broadcast::{broadcast_user_lists, BroadcastReport};
pub use engine::{NearbyEntry, ProximityEngine};
pub use volume::{Falloff, OutOfRange, VolumeModel};

use serde::{Deserialize, Serialize};

/// A point in world space, as reported by clients and the authority
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Reject coordinates that would poison distance math
    pub fn validate(&self) -> Result<(), PositionError> {
        if self.x.is_finite() && self.y.is_finite() && self.z.is_finite() {
            Ok(())
        } else {
            Err(PositionError::NonFinite)
        }
    }
}

/// Euclidean distance in 3-space
pub fn distance(a: &Position, b: &Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("position coordinates must be finite numbers")]
    NonFinite,
}

//! Nearby-set computation over a registry snapshot

use serde::Serialize;

use crate::session::{RegistrySnapshot, SessionRegistry};

use super::{distance, VolumeModel};

/// One other session within range, computed fresh per query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyEntry {
    pub username: String,
    pub distance: f64,
    pub volume: f64,
}

/// Full-scan proximity queries. The volume model's `max_distance` is the radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityEngine {
    model: VolumeModel,
}

impl ProximityEngine {
    pub fn new(model: VolumeModel) -> Self {
        Self { model }
    }

    pub fn radius(&self) -> f64 {
        self.model.max_distance
    }

    /// Sessions within radius of `identity`, taken from one fresh snapshot
    pub fn nearby_set(&self, registry: &SessionRegistry, identity: &str) -> Vec<NearbyEntry> {
        self.nearby_in(&registry.snapshot(), identity)
    }

    /// Sessions within radius of `identity` in `snapshot`; empty if the
    /// identity is not present
    pub fn nearby_in(&self, snapshot: &RegistrySnapshot, identity: &str) -> Vec<NearbyEntry> {
        let Some(origin) = snapshot.position_of(identity) else {
            return Vec::new();
        };

        let radius = self.radius();
        snapshot
            .iter()
            .filter(|s| s.identity() != identity)
            .filter_map(|s| {
                let d = distance(&origin, &s.position);
                (d <= radius).then(|| NearbyEntry {
                    username: s.identity().to_string(),
                    distance: d,
                    volume: self.model.volume(d),
                })
            })
            .collect()
    }
}

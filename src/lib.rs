//! # Proximity Voice Relay
//!
//! Tracks where connected players stand, tells each one who is in earshot,
//! and relays voice frames only to nearby listeners, attenuated by distance.
//!
//! - [`session`]: the registry of live sessions and their send queues
//! - [`proximity`]: distance, attenuation and nearby-set broadcast
//! - [`audio`]: per-recipient gain and audio fan-out
//! - [`sync`]: periodic pulls from the authoritative game-state API
//! - [`ws`] / [`http`]: the connection lifecycle and HTTP facade

pub mod app;
pub mod audio;
pub mod authority;
pub mod config;
pub mod http;
pub mod proximity;
pub mod session;
pub mod sync;
pub mod util;
pub mod ws;

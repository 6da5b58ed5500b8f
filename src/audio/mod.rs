//! Audio frame handling and relay

pub mod frame;
pub mod relay;

pub use frame::{rewrite_volume, FrameError, FrameFormat};
pub use relay::{AudioMode, AudioRelay, AudioSettings, RelayReport};

//! WebSocket connection handling

pub mod dispatch;
pub mod handler;
pub mod protocol;

//! Connected-session state

pub mod names;
pub mod registry;
pub mod transport;

pub use names::PlayerNameCache;
pub use registry::{RegistryError, RegistrySnapshot, Session, SessionRegistry};
pub use transport::{Outbound, SendError, Transport};

//! Application state shared across routes, connections and sync loops

use std::sync::Arc;

use crate::audio::AudioRelay;
use crate::authority::{AuthorityClient, AuthorityError};
use crate::config::Config;
use crate::proximity::ProximityEngine;
use crate::session::{PlayerNameCache, SessionRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub player_names: Arc<PlayerNameCache>,
    pub authority: AuthorityClient,
    pub engine: ProximityEngine,
    pub relay: AudioRelay,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AuthorityError> {
        let config = Arc::new(config);

        // Initialize authority client
        let authority = AuthorityClient::new(&config)?;

        let engine = ProximityEngine::new(config.volume);
        let relay = AudioRelay::new(engine, config.audio.clone());

        Ok(Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            player_names: Arc::new(PlayerNameCache::new()),
            authority,
            engine,
            relay,
        })
    }
}

//! Periodic synchronization with the authority
//!
//! Two independent loops run for the life of the process: a slow one that
//! refreshes the population list and a fast one that pulls every session's
//! position. Each pass ends with a full nearby-set broadcast.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::authority::{Authority, AuthorityError};
use crate::proximity::{broadcast_user_lists, BroadcastReport, Position};

/// Outcome of one position refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionRefreshReport {
    pub updated: usize,
    pub failed: usize,
    pub broadcast: BroadcastReport,
}

/// Bound an authority query so a hung request cannot stall its loop
async fn bounded<T>(
    limit: Duration,
    query: impl Future<Output = Result<T, AuthorityError>>,
) -> Result<T, AuthorityError> {
    timeout(limit, query).await.unwrap_or(Err(AuthorityError::Timeout))
}

/// Replace the name cache from the authority; keeps the old cache on failure.
/// Returns whether the cache was replaced.
pub async fn refresh_names<A: Authority>(state: &AppState, authority: &A) -> bool {
    let replaced = match bounded(state.config.authority_timeout, authority.player_list()).await {
        Ok(names) => {
            debug!(count = names.len(), "Refreshed player names");
            state.player_names.replace(names);
            true
        }
        Err(e) => {
            warn!(error = %e, "Player list refresh failed, keeping cached names");
            false
        }
    };

    broadcast_user_lists(&state.registry, &state.engine);
    replaced
}

/// Pull the authority position of every registered session.
///
/// Queries run concurrently and fail independently; a failed identity keeps
/// its last known position and stays registered.
pub async fn refresh_positions<A: Authority>(state: &AppState, authority: &A) -> PositionRefreshReport {
    let limit = state.config.authority_timeout;
    let identities = state.registry.identities();

    let results = join_all(
        identities
            .into_iter()
            .map(|identity| query_position(authority, identity, limit)),
    )
    .await;

    let mut report = PositionRefreshReport::default();
    for (identity, result) in results {
        match result {
            Ok(position) if state.registry.update_position(&identity, position) => report.updated += 1,
            Ok(_) => report.failed += 1,
            Err(e) => {
                warn!(identity = %identity, error = %e, "Position refresh failed");
                report.failed += 1;
            }
        }
    }

    report.broadcast = broadcast_user_lists(&state.registry, &state.engine);
    report
}

async fn query_position<A: Authority>(
    authority: &A,
    identity: String,
    limit: Duration,
) -> (String, Result<Position, AuthorityError>) {
    let result = bounded(limit, authority.player_position(&identity)).await;
    (identity, result)
}

/// Name refresh loop
pub async fn run_name_refresh<A: Authority>(state: AppState, authority: A) {
    let mut ticker = interval(state.config.name_refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(every = ?state.config.name_refresh_interval, "Player name refresh started");

    loop {
        ticker.tick().await;
        refresh_names(&state, &authority).await;
    }
}

/// Position refresh loop
pub async fn run_position_refresh<A: Authority>(state: AppState, authority: A) {
    let mut ticker = interval(state.config.position_refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(every = ?state.config.position_refresh_interval, "Position refresh started");

    loop {
        ticker.tick().await;
        let report = refresh_positions(&state, &authority).await;
        if report.failed > 0 {
            debug!(updated = report.updated, failed = report.failed, "Position refresh pass finished");
        }
    }
}

//! REST client for the authoritative game-state API

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::config::Config;
use crate::proximity::Position;

/// Source of ground-truth names and positions
pub trait Authority: Send + Sync {
    /// Every player name the authority currently knows
    fn player_list(&self) -> impl Future<Output = Result<Vec<String>, AuthorityError>> + Send;

    /// Current position of one player
    fn player_position(&self, name: &str) -> impl Future<Output = Result<Position, AuthorityError>> + Send;
}

/// HTTP client for `GET <base>/playerList` and `GET <base>/WorldPlayer`
#[derive(Clone)]
pub struct AuthorityClient {
    client: Client,
    base_url: String,
}

impl AuthorityClient {
    pub fn new(config: &Config) -> Result<Self, AuthorityError> {
        Self::with_base_url(&config.authority_base_url, config.authority_timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(AuthorityError::Request)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// GET an endpoint and decode its JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, AuthorityError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(AuthorityError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthorityError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(AuthorityError::Parse)
    }
}

impl Authority for AuthorityClient {
    async fn player_list(&self) -> Result<Vec<String>, AuthorityError> {
        let players: Vec<PlayerRecord> = self.get("playerList", &[]).await?;
        Ok(players.into_iter().filter_map(|p| p.name).collect())
    }

    async fn player_position(&self, name: &str) -> Result<Position, AuthorityError> {
        let records: Vec<WorldPlayerRecord> = self.get("WorldPlayer", &[("playerName", name)]).await?;
        records
            .into_iter()
            .next()
            .and_then(|r| r.position)
            .ok_or(AuthorityError::Malformed("no position in WorldPlayer response"))
    }
}

/// Entry of the `playerList` response
#[derive(Debug, Deserialize)]
struct PlayerRecord {
    #[serde(default)]
    name: Option<String>,
}

/// Entry of the `WorldPlayer` response; only the position is used
#[derive(Debug, Deserialize)]
struct WorldPlayerRecord {
    #[serde(default)]
    position: Option<Position>,
}

/// Authority query failures
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("Query timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    Malformed(&'static str),
}

impl AuthorityError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(e)
        }
    }
}

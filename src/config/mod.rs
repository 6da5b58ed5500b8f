//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::audio::{AudioMode, AudioSettings, FrameFormat};
use crate::proximity::{Falloff, OutOfRange, VolumeModel};

/// Tracing output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// Base URL of the authoritative game-state API
    pub authority_base_url: String,
    /// Upper bound on any single authority query
    pub authority_timeout: Duration,
    pub name_refresh_interval: Duration,
    pub position_refresh_interval: Duration,

    /// Attenuation curve; `max_distance` is the proximity radius
    pub volume: VolumeModel,
    pub audio: AudioSettings,

    /// Per-session outbound queue depth
    pub send_queue_capacity: usize,
    /// Upper bound on one websocket write before the peer is dropped
    pub send_timeout: Duration,
    /// Inbound text messages per second per connection
    pub control_rate_limit: u32,

    /// Directory served for non-API paths
    pub static_dir: PathBuf,
    /// Allowed client origins for CORS, comma-separated, `*` for any
    pub client_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 19133)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            authority_base_url: "http://localhost:5000/api/get".to_string(),
            authority_timeout: Duration::from_millis(2000),
            name_refresh_interval: Duration::from_secs(5),
            position_refresh_interval: Duration::from_millis(1000),
            volume: VolumeModel::default(),
            audio: AudioSettings::default(),
            send_queue_capacity: 64,
            send_timeout: Duration::from_millis(5000),
            control_rate_limit: 30,
            static_dir: PathBuf::from("public"),
            client_origin: "*".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup; unset keys keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // PaaS hosts provide PORT, fall back to SERVER_ADDR or default
        let server_addr: SocketAddr = match (lookup("PORT"), lookup("SERVER_ADDR")) {
            (Some(port), _) => format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            (None, Some(addr)) => addr.parse().map_err(|_| ConfigError::InvalidAddress)?,
            (None, None) => defaults.server_addr,
        };

        let volume = VolumeModel {
            max_distance: parse_or(&lookup, "PROXIMITY_RADIUS", defaults.volume.max_distance)?,
            max_volume: parse_or(&lookup, "MAX_VOLUME", defaults.volume.max_volume)?,
            min_volume: parse_or(&lookup, "MIN_VOLUME", defaults.volume.min_volume)?,
            falloff: parse_or::<Falloff, _>(&lookup, "VOLUME_FALLOFF", defaults.volume.falloff)?,
            out_of_range: parse_or::<OutOfRange, _>(&lookup, "OUT_OF_RANGE", defaults.volume.out_of_range)?,
        };

        let audio = AudioSettings {
            mode: parse_or::<AudioMode, _>(&lookup, "AUDIO_MODE", defaults.audio.mode)?,
            format: FrameFormat {
                preamble_len: parse_or(&lookup, "AUDIO_PREAMBLE_BYTES", defaults.audio.format.preamble_len)?,
                signature: lookup("AUDIO_SIGNATURE")
                    .map(String::into_bytes)
                    .unwrap_or(defaults.audio.format.signature),
            },
        };

        let config = Self {
            server_addr,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or::<LogFormat, _>(&lookup, "LOG_FORMAT", defaults.log_format)?,

            authority_base_url: lookup("AUTHORITY_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.authority_base_url),
            authority_timeout: Duration::from_millis(parse_or(&lookup, "AUTHORITY_TIMEOUT_MS", 2000u64)?),
            name_refresh_interval: Duration::from_secs(parse_or(&lookup, "NAME_REFRESH_SECS", 5u64)?),
            position_refresh_interval: Duration::from_millis(parse_or(&lookup, "POSITION_REFRESH_MS", 1000u64)?),

            volume,
            audio,

            send_queue_capacity: parse_or(&lookup, "SEND_QUEUE_CAPACITY", defaults.send_queue_capacity)?,
            send_timeout: Duration::from_millis(parse_or(&lookup, "SEND_TIMEOUT_MS", 5000u64)?),
            control_rate_limit: parse_or(&lookup, "CONTROL_RATE_LIMIT", defaults.control_rate_limit)?,

            static_dir: lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or(defaults.client_origin),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.volume;
        if !(v.max_distance.is_finite() && v.max_distance > 0.0) {
            return Err(invalid("PROXIMITY_RADIUS", "must be a positive number"));
        }
        if !(v.max_volume.is_finite() && v.max_volume > 0.0) {
            return Err(invalid("MAX_VOLUME", "must be a positive number"));
        }
        if !(v.min_volume.is_finite() && v.min_volume >= 0.0 && v.min_volume <= v.max_volume) {
            return Err(invalid("MIN_VOLUME", "must be between 0 and MAX_VOLUME"));
        }
        if self.audio.format.signature.len() > self.audio.format.preamble_len {
            return Err(invalid("AUDIO_SIGNATURE", "must fit inside the preamble"));
        }
        if self.authority_timeout.is_zero() {
            return Err(invalid("AUTHORITY_TIMEOUT_MS", "must be greater than zero"));
        }
        if self.name_refresh_interval.is_zero() {
            return Err(invalid("NAME_REFRESH_SECS", "must be greater than zero"));
        }
        if self.position_refresh_interval.is_zero() {
            return Err(invalid("POSITION_REFRESH_MS", "must be greater than zero"));
        }
        if self.send_queue_capacity == 0 {
            return Err(invalid("SEND_QUEUE_CAPACITY", "must be greater than zero"));
        }
        if self.send_timeout.is_zero() {
            return Err(invalid("SEND_TIMEOUT_MS", "must be greater than zero"));
        }
        if self.control_rate_limit == 0 {
            return Err(invalid("CONTROL_RATE_LIMIT", "must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn invalid(var: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

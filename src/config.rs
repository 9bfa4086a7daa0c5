//! Process configuration read from the environment (and `.env`, loaded by `main`).

use std::env;
use std::time::Duration;

use humantime_serde::re::humantime;
use thiserror::Error;

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_RECONNECT_DELAY_MAX: Duration = Duration::from_secs(5);
const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

/// Errors raised while reading configuration. Any of these aborts startup.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub prefix: String,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub reconnect_delay_max: Duration,
    pub ytdlp_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let discord_token = var("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let cache_capacity = match var("TRACK_CACHE_CAPACITY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        name: "TRACK_CACHE_CAPACITY",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(capacity) => capacity,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "TRACK_CACHE_CAPACITY",
                        reason: e.to_string(),
                    });
                }
            },
            None => DEFAULT_CACHE_CAPACITY,
        };

        Ok(Self {
            discord_token,
            prefix: var("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            cache_capacity,
            cache_ttl: parse_duration("TRACK_CACHE_TTL", var("TRACK_CACHE_TTL"), DEFAULT_CACHE_TTL)?,
            reconnect_delay_max: parse_duration(
                "STREAM_RECONNECT_DELAY_MAX",
                var("STREAM_RECONNECT_DELAY_MAX"),
                DEFAULT_RECONNECT_DELAY_MAX,
            )?,
            ytdlp_path: var("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string()),
        })
    }
}

fn parse_duration(
    name: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        Some(raw) => humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

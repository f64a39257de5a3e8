//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::util::rate_limit::SNIPPET_FETCH_RATE_LIMIT;
use crate::util::time::{DEFAULT_FRAME_RATE_MS, DEFAULT_TICK_RATE_MS};

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// Simulation tick period
    pub tick_rate: Duration,
    /// Presenter frame period
    pub frame_rate: Duration,
    /// Fixed RNG seed; random per session when unset
    pub match_seed: Option<u64>,

    /// GitHub REST API base URL
    pub github_api_url: String,
    /// Optional token to lift anonymous search limits
    pub github_token: Option<String>,
    /// Outbound snippet fetch quota
    pub snippet_fetch_per_minute: u32,
    /// Fetch from GitHub at all; otherwise bundled snippets only
    pub remote_snippets: bool,

    /// Directory holding the high-score file
    pub score_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tick_ms: u64 = parse_var(&lookup, "TICK_RATE_MS")?.unwrap_or(DEFAULT_TICK_RATE_MS);
        let frame_ms: u64 = parse_var(&lookup, "FRAME_RATE_MS")?.unwrap_or(DEFAULT_FRAME_RATE_MS);
        if tick_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "TICK_RATE_MS",
                value: tick_ms.to_string(),
            });
        }
        if frame_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "FRAME_RATE_MS",
                value: frame_ms.to_string(),
            });
        }

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: parse_log_format(&lookup)?,

            tick_rate: Duration::from_millis(tick_ms),
            frame_rate: Duration::from_millis(frame_ms),
            match_seed: parse_var(&lookup, "MATCH_SEED")?,

            github_api_url: lookup("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_token: lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()),
            snippet_fetch_per_minute: parse_var(&lookup, "SNIPPET_FETCH_PER_MINUTE")?
                .unwrap_or(SNIPPET_FETCH_RATE_LIMIT),
            remote_snippets: parse_bool(&lookup, "REMOTE_SNIPPETS")?.unwrap_or(true),

            score_dir: lookup("SCORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { var, value }),
        },
        None => Ok(None),
    }
}

fn parse_log_format<F>(lookup: &F) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("LOG_FORMAT") {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(false),
            "json" => Ok(true),
            _ => Err(ConfigError::Invalid {
                var: "LOG_FORMAT",
                value,
            }),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

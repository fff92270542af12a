//! Service configuration.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults ([`Config::default`])
//! 2. an optional TOML file passed with `--config` ([`Config::load`])
//! 3. environment variables ([`Config::apply_env`]): `PORT` and `RSSIFY_USER_AGENT`
//!
//! A missing or empty file yields the defaults. Unknown keys are accepted
//! but logged, since they are usually typos.
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{ttl_from_secs, DEFAULT_TTL_SECS};
use crate::feed::DEFAULT_USER_AGENT;
use crate::util::TargetPolicy;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP port; the listener binds on all interfaces.
    pub port: u16,

    /// User-Agent header sent with every page fetch.
    pub user_agent: String,

    /// Upper bound for one page fetch, including the body read.
    pub fetch_timeout_secs: u64,

    /// How long a rendered feed is served from cache.
    pub cache_ttl_secs: u64,

    /// Item count used when the request has no usable `limit`.
    pub default_limit: usize,

    /// Largest `limit` a request may ask for.
    pub max_limit: usize,

    /// Refuse to fetch localhost and private network addresses.
    pub block_private_hosts: bool,

    /// Include the underlying error text in 500 responses.
    pub expose_error_details: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: 20,
            cache_ttl_secs: DEFAULT_TTL_SECS,
            default_limit: 30,
            max_limit: 100,
            block_private_hosts: false,
            expose_error_details: true,
        }
    }
}

const KNOWN_KEYS: [&str; 8] = [
    "port",
    "user_agent",
    "fetch_timeout_secs",
    "cache_ttl_secs",
    "default_limit",
    "max_limit",
    "block_private_hosts",
    "expose_error_details",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), port = config.port, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text. Blank input yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                reason: format!("'{port}' is not a valid port number"),
            })?;
        }

        if let Some(agent) = lookup("RSSIFY_USER_AGENT") {
            if !agent.trim().is_empty() {
                self.user_agent = agent;
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "max_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "fetch_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> chrono::TimeDelta {
        ttl_from_secs(self.cache_ttl_secs)
    }

    pub fn target_policy(&self) -> TargetPolicy {
        TargetPolicy::from_block_private(self.block_private_hosts)
    }
}

// ============================================================================
// Tests
// ============================================================================

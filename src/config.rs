//! Configuration management for writegate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Limit applied by a single rate limiter: at most `max_requests` write
/// attempts per rolling `window_ms` window.
///
/// Each call site carries its own config (e.g. 3/hour for contact mail,
/// 30/minute for engagement beacons); limiters built from different configs
/// never share state. Both fields must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Rolling window length in milliseconds
    pub window_ms: u64,
    /// Maximum requests allowed inside the window
    pub max_requests: u32,
}

impl RateLimitConfig {
    /// Create a config allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            window_ms: window.as_millis() as u64,
            max_requests,
        }
    }

    /// The rolling window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Ambient deployment configuration.
///
/// The presence of `database_url` decides the backend once, at limiter
/// construction: set, checks go through the shared durable store and are
/// enforced across every instance; unset, each process keeps its own
/// in-memory window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Connection string for the shared event store, e.g.
    /// `sqlite://writegate.db`. In-memory limiting when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Per-check timeout for the store round trip, in milliseconds.
    /// A check that exceeds it fails open.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Retention used by the external purge task, in hours. Must be at
    /// least as long as the largest configured window; the windowed count
    /// query, not the purge, enforces each limit.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            store_timeout_ms: default_store_timeout_ms(),
            retention_hours: default_retention_hours(),
        }
    }
}

fn default_store_timeout_ms() -> u64 {
    1500
}

fn default_retention_hours() -> u64 {
    24
}

impl DeploymentConfig {
    /// Read deployment configuration from the environment.
    ///
    /// `DATABASE_URL` selects the durable store; `WRITEGATE_STORE_TIMEOUT_MS`
    /// and `WRITEGATE_RETENTION_HOURS` override their defaults when set to
    /// parseable values.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            store_timeout_ms: env_u64("WRITEGATE_STORE_TIMEOUT_MS")
                .unwrap_or_else(default_store_timeout_ms),
            retention_hours: env_u64("WRITEGATE_RETENTION_HOURS")
                .unwrap_or_else(default_retention_hours),
        }
    }

    /// The store timeout as a `Duration`.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// The purge retention as a `Duration`.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Top-level configuration: deployment settings plus the per-endpoint
/// limits declared at route-table initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritegateConfig {
    /// Deployment configuration
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Limits keyed by endpoint purpose tag (e.g. `contact`, `engagement`)
    #[serde(default)]
    pub endpoints: HashMap<String, RateLimitConfig>,
}

impl WritegateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| crate::error::WritegateError::Config(e.to_string()))
    }
}

//! Limiter construction from ambient deployment configuration.

use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::config::{DeploymentConfig, RateLimitConfig, WritegateConfig};
use crate::error::Result;
use crate::store::SqliteWindowStore;

use super::limiter::RateLimiter;
use super::memory::InMemoryWindowBackend;
use super::persistent::PersistentWindowBackend;

/// Builds `RateLimiter`s bound to the backend the deployment calls for.
///
/// The choice is made once, here: a configured store means every limiter
/// built by this factory shares the durable window; no store means each
/// limiter keeps a process-local window. The choice is never re-evaluated
/// per call. A store that cannot be opened at construction is a
/// configuration error; fail-open covers per-check faults only.
pub struct RateLimiterFactory {
    store: Option<SqliteWindowStore>,
    store_timeout: Duration,
    endpoints: HashMap<String, RateLimitConfig>,
}

impl RateLimiterFactory {
    /// Build a factory from deployment configuration, connecting the
    /// durable store when one is configured.
    pub async fn from_deployment(deployment: &DeploymentConfig) -> Result<Self> {
        let store = match &deployment.database_url {
            Some(url) => Some(SqliteWindowStore::connect(url).await?),
            None => None,
        };

        info!(
            backend = if store.is_some() { "persistent" } else { "memory" },
            "Rate limiting backend selected"
        );

        Ok(Self {
            store,
            store_timeout: deployment.store_timeout(),
            endpoints: HashMap::new(),
        })
    }

    /// Build a factory from a full configuration, including the
    /// per-endpoint limits map.
    pub async fn from_config(config: &WritegateConfig) -> Result<Self> {
        let mut factory = Self::from_deployment(&config.deployment).await?;
        factory.endpoints = config.endpoints.clone();
        Ok(factory)
    }

    /// Build a limiter for the given limit, bound to this deployment's
    /// backend.
    pub fn limiter(&self, config: RateLimitConfig) -> RateLimiter {
        match &self.store {
            Some(store) => RateLimiter::new(
                config,
                Box::new(PersistentWindowBackend::new(
                    store.clone(),
                    config,
                    self.store_timeout,
                )),
            ),
            None => RateLimiter::new(config, Box::new(InMemoryWindowBackend::new(config))),
        }
    }

    /// Build a limiter for a configured endpoint purpose, or `None` when
    /// the purpose has no configured limit.
    pub fn limiter_for(&self, purpose: &str) -> Option<RateLimiter> {
        self.endpoints.get(purpose).map(|config| self.limiter(*config))
    }

    /// The shared event store, when one is configured. The external
    /// maintenance task uses this to run its retention purge.
    pub fn store(&self) -> Option<&SqliteWindowStore> {
        self.store.as_ref()
    }
}

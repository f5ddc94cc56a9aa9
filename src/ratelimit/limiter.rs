//! Core rate limiter implementation.

use chrono::Utc;
use tracing::{trace, warn};

use crate::config::RateLimitConfig;

use super::backend::WindowBackend;
use super::memory::InMemoryWindowBackend;
use super::verdict::Verdict;

/// The public-facing rate limiter.
///
/// Wraps exactly one window backend, chosen at construction, and never
/// fails its caller: a backend fault is absorbed and converted to an
/// allowing verdict with full remaining capacity (fail open). A guard
/// that can itself take the request down defeats its purpose, so the only
/// externally observable outcome besides "allowed" is "denied".
///
/// Construct one limiter per distinct config/purpose; limiters never share
/// window state.
pub struct RateLimiter {
    config: RateLimitConfig,
    backend: Box<dyn WindowBackend>,
}

impl RateLimiter {
    /// Create a rate limiter bound to the given backend.
    pub fn new(config: RateLimitConfig, backend: Box<dyn WindowBackend>) -> Self {
        Self { config, backend }
    }

    /// Create a rate limiter over a fresh in-memory backend.
    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(config, Box::new(InMemoryWindowBackend::new(config)))
    }

    /// The limit this limiter enforces.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Short name of the bound backend for log lines.
    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Check whether `identifier` may make another write attempt now.
    ///
    /// Always resolves to a verdict; backend faults degrade silently to
    /// "allowed". The empty identifier is a valid bucket of its own;
    /// callers are expected to namespace identifiers by purpose (see
    /// `identity::scope_identifier`).
    pub async fn check_rate_limit(&self, identifier: &str) -> Verdict {
        let now_ms = Utc::now().timestamp_millis();

        trace!(
            identifier = %identifier,
            backend = self.backend.kind(),
            "Checking rate limit"
        );

        match self.backend.check(identifier, now_ms).await {
            Ok(verdict) => verdict,
            Err(error) => {
                warn!(
                    identifier = %identifier,
                    backend = self.backend.kind(),
                    error = %error,
                    "Rate limit backend unavailable, failing open"
                );
                Verdict::allow(self.config.max_requests)
            }
        }
    }
}

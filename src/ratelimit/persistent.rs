//! Durable-store-backed sliding-window backend.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::error::{Result, WritegateError};
use crate::store::WindowStore;

use super::backend::WindowBackend;
use super::verdict::Verdict;

/// Sliding-window backend over a shared durable store, usable across many
/// memory-isolated instances.
///
/// Each check inserts one event record and counts the records inside the
/// window in a single atomic store operation. The insert happens before the
/// threshold is evaluated, so a denied attempt still counts toward the
/// window, so a client cannot probe its way past the limit for free. The
/// trade-off is that `retry_after` on denial is the conservative full
/// window rather than the precise time to the next free slot. (The
/// in-memory backend deliberately differs, see `InMemoryWindowBackend`.)
///
/// The store round trip is bounded by `store_timeout`; an elapsed timeout
/// is reported like any other store error and fails open at the limiter.
pub struct PersistentWindowBackend<S: WindowStore> {
    store: S,
    config: RateLimitConfig,
    store_timeout: Duration,
}

impl<S: WindowStore> PersistentWindowBackend<S> {
    /// Create a new persistent backend over `store` for the given limit.
    pub fn new(store: S, config: RateLimitConfig, store_timeout: Duration) -> Self {
        Self {
            store,
            config,
            store_timeout,
        }
    }
}

#[async_trait]
impl<S: WindowStore> WindowBackend for PersistentWindowBackend<S> {
    async fn check(&self, identifier: &str, now_ms: i64) -> Result<Verdict> {
        let cutoff = now_ms - self.config.window_ms as i64;

        let count = match tokio::time::timeout(
            self.store_timeout,
            self.store.record_and_count(identifier, now_ms, cutoff),
        )
        .await
        {
            Ok(count) => count?,
            Err(_) => return Err(WritegateError::StoreTimeout(self.store_timeout)),
        };

        if count > self.config.max_requests {
            debug!(
                identifier = %identifier,
                count,
                limit = self.config.max_requests,
                "Rate limit exceeded"
            );
            return Ok(Verdict::deny(self.config.window_ms.div_ceil(1000)));
        }

        Ok(Verdict::allow(self.config.max_requests.saturating_sub(count)))
    }

    fn kind(&self) -> &'static str {
        "persistent"
    }
}

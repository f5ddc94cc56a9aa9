//! Process-local sliding-window backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::config::RateLimitConfig;
use crate::error::Result;

use super::backend::WindowBackend;
use super::verdict::Verdict;

/// In-process sliding-window backend.
///
/// Keeps, per identifier, the timestamps of accepted requests still inside
/// the window. The map is owned by this instance and never shared across
/// limiters; construct one backend per distinct config/purpose.
///
/// Denied attempts are not recorded, so a denied client regains its full
/// capacity as soon as the window rolls (the durable backend deliberately
/// differs, see `PersistentWindowBackend`). The whole read-modify-write
/// runs under one write guard, so two concurrent checks for the same
/// identifier cannot both claim the last free slot.
///
/// Not durable and not shared: suitable only for a single long-lived
/// process.
pub struct InMemoryWindowBackend {
    config: RateLimitConfig,
    /// Accepted-request timestamps (ms since epoch) indexed by identifier
    buckets: RwLock<HashMap<String, Vec<i64>>>,
}

impl InMemoryWindowBackend {
    /// Create a new in-memory backend for the given limit.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Run one check at an explicit `now_ms`.
    ///
    /// Every check also sweeps buckets whose timestamps have all expired,
    /// bounding memory for inactive identifiers without a timer.
    pub fn check_at(&self, identifier: &str, now_ms: i64) -> Verdict {
        let window_ms = self.config.window_ms as i64;
        let cutoff = now_ms - window_ms;

        let mut buckets = self.buckets.write();
        buckets.retain(|_, stamps| stamps.iter().any(|&t| t > cutoff));

        let bucket = buckets.entry(identifier.to_string()).or_default();
        bucket.retain(|&t| t > cutoff);

        if bucket.len() as u32 >= self.config.max_requests {
            // Timestamps are appended in order, so the first is the oldest;
            // the fallback only fires for a zero-limit config.
            let retry_after_secs = match bucket.first() {
                Some(&oldest) => ((oldest + window_ms - now_ms) as u64).div_ceil(1000),
                None => self.config.window_ms.div_ceil(1000),
            };
            debug!(
                identifier = %identifier,
                limit = self.config.max_requests,
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Verdict::deny(retry_after_secs);
        }

        bucket.push(now_ms);
        let remaining = self.config.max_requests - bucket.len() as u32;
        trace!(identifier = %identifier, remaining, "Request inside window");
        Verdict::allow(remaining)
    }

    /// Number of identifiers currently tracked.
    ///
    /// This is primarily useful for testing.
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }
}

#[async_trait]
impl WindowBackend for InMemoryWindowBackend {
    async fn check(&self, identifier: &str, now_ms: i64) -> Result<Verdict> {
        Ok(self.check_at(identifier, now_ms))
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000_000;

    fn backend(max_requests: u32, window: Duration) -> InMemoryWindowBackend {
        InMemoryWindowBackend::new(RateLimitConfig::new(max_requests, window))
    }

    #[test]
    fn test_remaining_decreases_until_denial() {
        let backend = backend(3, Duration::from_secs(60));

        for (i, expected_remaining) in [(1u32, 2u32), (2, 1), (3, 0)] {
            let verdict = backend.check_at("1.2.3.4", NOW + i as i64);
            assert!(verdict.is_allowed(), "check {} should be allowed", i);
            assert_eq!(verdict.remaining, expected_remaining);
        }

        let verdict = backend.check_at("1.2.3.4", NOW + 4);
        assert!(!verdict.is_allowed());
        assert_eq!(verdict.remaining, 0);
        let retry = verdict.retry_after_secs.unwrap();
        assert!(retry > 0 && retry <= 60);
    }

    #[test]
    fn test_window_rolls_over() {
        let backend = backend(3, Duration::from_secs(60));

        for i in 0..3 {
            backend.check_at("1.2.3.4", NOW + i);
        }
        assert!(!backend.check_at("1.2.3.4", NOW + 3).is_allowed());

        // 61s after the first request the window has fully elapsed
        let verdict = backend.check_at("1.2.3.4", NOW + 61_000);
        assert!(verdict.is_allowed());
        assert_eq!(verdict.remaining, 2);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let backend = backend(2, Duration::from_secs(60));

        backend.check_at("1.2.3.4", NOW);
        backend.check_at("1.2.3.4", NOW + 1);
        assert!(!backend.check_at("1.2.3.4", NOW + 2).is_allowed());

        let verdict = backend.check_at("5.6.7.8", NOW + 3);
        assert!(verdict.is_allowed());
        assert_eq!(verdict.remaining, 1);
    }

    #[test]
    fn test_denied_attempts_are_not_recorded() {
        let backend = backend(1, Duration::from_secs(60));

        assert!(backend.check_at("1.2.3.4", NOW).is_allowed());
        assert!(!backend.check_at("1.2.3.4", NOW + 30_000).is_allowed());

        // Had the denial been recorded, its timestamp would still be inside
        // the window here
        assert!(backend.check_at("1.2.3.4", NOW + 60_001).is_allowed());
    }

    #[test]
    fn test_retry_after_tracks_oldest_timestamp() {
        let backend = backend(1, Duration::from_secs(60));

        backend.check_at("1.2.3.4", NOW);
        let verdict = backend.check_at("1.2.3.4", NOW + 30_000);
        // 30s of the window remain for the oldest recorded request
        assert_eq!(verdict.retry_after_secs, Some(30));
    }

    #[test]
    fn test_expired_buckets_are_swept() {
        let backend = backend(3, Duration::from_secs(60));

        backend.check_at("1.2.3.4", NOW);
        assert_eq!(backend.bucket_count(), 1);

        // A check for any identifier sweeps expired buckets
        backend.check_at("5.6.7.8", NOW + 61_000);
        assert_eq!(backend.bucket_count(), 1);
    }

    #[test]
    fn test_empty_identifier_is_a_valid_bucket() {
        let backend = backend(1, Duration::from_secs(60));

        assert!(backend.check_at("", NOW).is_allowed());
        assert!(!backend.check_at("", NOW + 1).is_allowed());
    }

    #[tokio::test]
    async fn test_backend_trait_delegates() {
        let backend = backend(2, Duration::from_secs(60));

        let verdict = backend.check("1.2.3.4", NOW).await.unwrap();
        assert!(verdict.is_allowed());
        assert_eq!(verdict.remaining, 1);
        assert_eq!(backend.kind(), "memory");
    }
}

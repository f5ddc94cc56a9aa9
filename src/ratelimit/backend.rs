//! Window backend trait for abstracting in-memory and durable-store
//! implementations.

use async_trait::async_trait;

use crate::error::Result;

use super::verdict::Verdict;

/// Trait for sliding-window backend implementations.
///
/// This trait abstracts over the process-local `InMemoryWindowBackend` and
/// the store-backed `PersistentWindowBackend` so a `RateLimiter` can be
/// bound to either, chosen once at construction. `now_ms` is supplied by
/// the caller (milliseconds since epoch) so tests can drive the window
/// without sleeping.
///
/// An `Err` means the backend could not reach a verdict; the `RateLimiter`
/// converts it to an allowing verdict (fail open), never the backend itself.
#[async_trait]
pub trait WindowBackend: Send + Sync {
    /// Record a check attempt for `identifier` at `now_ms` and decide
    /// whether it is inside the configured window limit.
    async fn check(&self, identifier: &str, now_ms: i64) -> Result<Verdict>;

    /// Short name of this backend for log lines.
    fn kind(&self) -> &'static str;
}

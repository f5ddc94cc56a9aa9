//! Durable store surface for the shared sliding window.
//!
//! The persistent backend records one event row per attempted check and
//! counts the rows still inside the window; growth is bounded by an
//! external maintenance task calling [`WindowStore::purge_older_than`] on
//! its own schedule. Correctness never depends on that schedule, only on
//! the windowed count.

mod sqlite;

pub use sqlite::SqliteWindowStore;

use async_trait::async_trait;

use crate::error::Result;

/// A durable store of window event records, shared across every process
/// instance.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Insert one event record for `identifier` at `occurred_at_ms` and
    /// return the post-insert count of records with
    /// `occurred_at_ms > cutoff_ms`, as a single atomic operation.
    ///
    /// The insert is unconditional: an attempt that ends up denied still
    /// leaves its record behind and counts toward the window.
    async fn record_and_count(
        &self,
        identifier: &str,
        occurred_at_ms: i64,
        cutoff_ms: i64,
    ) -> Result<u32>;

    /// Delete every record with `occurred_at_ms <= cutoff_ms`, returning
    /// the number of rows removed. Invoked by the external maintenance
    /// task; the retention must cover the largest configured window.
    async fn purge_older_than(&self, cutoff_ms: i64) -> Result<u64>;
}

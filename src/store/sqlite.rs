//! SQLite implementation of the window event store.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, error};

use crate::error::Result;

use super::WindowStore;

/// SQLite-backed window event store.
///
/// Wraps a connection pool; cloning shares the pool, so one store can serve
/// every limiter in the process. `record_and_count` runs its insert and
/// windowed count inside a single transaction: the count observes the
/// uncommitted insert, and no second racing round trip exists.
#[derive(Clone)]
pub struct SqliteWindowStore {
    pool: SqlitePool,
}

impl SqliteWindowStore {
    /// Wrap an existing pool. The schema must already exist; see
    /// [`SqliteWindowStore::ensure_schema`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a store at `url` (e.g. `sqlite://writegate.db`), creating the
    /// database file and schema if absent.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                crate::error::WritegateError::Config(format!("invalid store url: {}", e))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        debug!(url = %url, "Connected window event store");
        Ok(store)
    }

    /// Create the event table and its lookup index if they do not exist.
    /// Idempotent.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rate_limit_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identifier TEXT NOT NULL,
                occurred_at_ms INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_rate_limit_events_identifier
             ON rate_limit_events (identifier, occurred_at_ms)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WindowStore for SqliteWindowStore {
    async fn record_and_count(
        &self,
        identifier: &str,
        occurred_at_ms: i64,
        cutoff_ms: i64,
    ) -> Result<u32> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO rate_limit_events (identifier, occurred_at_ms) VALUES (?1, ?2)")
            .bind(identifier)
            .bind(occurred_at_ms)
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rate_limit_events
             WHERE identifier = ?1 AND occurred_at_ms > ?2",
        )
        .bind(identifier)
        .bind(cutoff_ms)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit window event");
            e
        })?;

        Ok(count as u32)
    }

    async fn purge_older_than(&self, cutoff_ms: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM rate_limit_events WHERE occurred_at_ms <= ?1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        debug!(cutoff_ms, purged, "Purged expired window events");
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn memory_store() -> SqliteWindowStore {
        // A single connection keeps every query on the same in-memory
        // database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteWindowStore::new(pool);
        assert_ok!(store.ensure_schema().await);
        store
    }

    #[tokio::test]
    async fn test_record_and_count_increments() {
        let store = memory_store().await;

        assert_eq!(store.record_and_count("1.2.3.4", 1_000, 0).await.unwrap(), 1);
        assert_eq!(store.record_and_count("1.2.3.4", 2_000, 0).await.unwrap(), 2);
        assert_eq!(store.record_and_count("1.2.3.4", 3_000, 0).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_count_excludes_records_outside_window() {
        let store = memory_store().await;

        store.record_and_count("1.2.3.4", 1_000, 0).await.unwrap();
        store.record_and_count("1.2.3.4", 2_000, 0).await.unwrap();

        // Only the 2_000 record and the fresh insert are inside the cutoff
        let count = store.record_and_count("1.2.3.4", 3_000, 1_500).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let store = memory_store().await;

        store.record_and_count("1.2.3.4", 1_000, 0).await.unwrap();
        store.record_and_count("1.2.3.4", 1_100, 0).await.unwrap();

        let count = store.record_and_count("5.6.7.8", 1_200, 0).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_records() {
        let store = memory_store().await;

        store.record_and_count("1.2.3.4", 1_000, 0).await.unwrap();
        store.record_and_count("1.2.3.4", 2_000, 0).await.unwrap();
        store.record_and_count("1.2.3.4", 9_000, 0).await.unwrap();

        let purged = store.purge_older_than(2_000).await.unwrap();
        assert_eq!(purged, 2);

        // The 9_000 record survives the purge
        let count = store.record_and_count("1.2.3.4", 9_100, 0).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = memory_store().await;
        assert_ok!(store.ensure_schema().await);
    }
}

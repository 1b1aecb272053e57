//! Account History Module
//!
//! Per-account rollups of past payments (daily/monthly/annual outcome and
//! annual income) used by the restriction policy. The store is populated by
//! the ingestion pipeline; this crate only reads it, through
//! [`AccountHistoryCache`], and reacts to ledger-close events by invalidating
//! cached entries.

mod cache;
mod listener;
mod memory;
mod sqlite;
mod watcher;

pub use cache::{AccountHistoryCache, CacheStats, DEFAULT_CAPACITY};
pub use listener::{IngestionEvent, InvalidationListener};
pub use memory::MemoryHistory;
pub use sqlite::SqliteHistory;
pub use watcher::IngestionWatcher;

use crate::error::StoreError;
use crate::types::{AccountId, HistoricalAggregate};
use async_trait::async_trait;

/// Query interface over historical aggregates.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Aggregate as of the latest ingested ledger. Accounts without history
    /// yield [`HistoricalAggregate::empty`], not an error.
    async fn account_aggregate(&self, id: &AccountId) -> Result<HistoricalAggregate, StoreError>;

    /// Highest ledger any aggregate was updated in, 0 for an empty store.
    async fn latest_ledger(&self) -> Result<u32, StoreError>;

    /// Accounts whose aggregate changed in a ledger after `after`, with that
    /// ledger, ordered by ledger.
    async fn changed_since(&self, after: u32) -> Result<Vec<(u32, AccountId)>, StoreError>;
}

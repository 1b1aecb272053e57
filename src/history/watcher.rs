//! Ingestion Watcher
//!
//! Polls the history store for aggregates written by the ingestion pipeline
//! and publishes one [`IngestionEvent`] per newly seen ledger.

use super::{HistoryStore, IngestionEvent};
use crate::error::StoreError;
use crate::types::AccountId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub struct IngestionWatcher {
    store: Arc<dyn HistoryStore>,
    events: broadcast::Sender<IngestionEvent>,
    interval: Duration,
    /// Last ledger already published. `None` until the first poll.
    last_ledger: Option<u32>,
}

impl IngestionWatcher {
    /// Creates a new watcher
    ///
    /// # Arguments
    /// * `store` - History store written by the ingestion pipeline
    /// * `events` - Channel the invalidation listener subscribes to
    /// * `interval` - Pause between polls
    pub fn new(
        store: Arc<dyn HistoryStore>,
        events: broadcast::Sender<IngestionEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            events,
            interval,
            last_ledger: None,
        }
    }

    /// Polls forever. Store errors are logged and retried on the next tick.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("Ingestion watcher starting, polling every {:?}", self.interval);
        loop {
            match self.poll().await {
                Ok(0) => {}
                Ok(published) => debug!("Published {} ledger events", published),
                Err(e) => warn!("Failed to poll history store: {}", e),
            }
            sleep(self.interval).await;
        }
    }

    /// Publishes events for ledgers ingested since the last poll and
    /// returns how many were sent.
    ///
    /// # Returns
    /// * `Ok(n)` - Number of `LedgerClosed` events sent
    /// * `Err(StoreError)` - Nothing was sent and the position is unchanged
    ///
    /// The first successful poll has no position to diff against. Lookups
    /// may already have cached aggregates from before that point, so it
    /// publishes the current ledger with an empty account list, which
    /// clears the whole cache.
    pub async fn poll(&mut self) -> Result<usize, StoreError> {
        let Some(last) = self.last_ledger else {
            let latest = self.store.latest_ledger().await?;
            debug!("History store at ledger {}, resetting cache", latest);
            let _ = self.events.send(IngestionEvent::LedgerClosed {
                sequence: latest,
                accounts: Vec::new(),
            });
            self.last_ledger = Some(latest);
            return Ok(1);
        };

        let changes = self.store.changed_since(last).await?;
        let mut by_ledger: BTreeMap<u32, Vec<AccountId>> = BTreeMap::new();
        for (ledger, account) in changes {
            by_ledger.entry(ledger).or_default().push(account);
        }

        let published = by_ledger.len();
        for (sequence, accounts) in by_ledger {
            // No receivers just means nobody caches yet
            let _ = self
                .events
                .send(IngestionEvent::LedgerClosed { sequence, accounts });
            self.last_ledger = Some(sequence);
        }
        Ok(published)
    }
}

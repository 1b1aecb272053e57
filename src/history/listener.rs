//! Ingestion Listener
//!
//! Consumes events published by the ingestion pipeline and keeps the
//! [`AccountHistoryCache`] coherent with the history store.
//!
//! # Events Handled
//! - **LedgerClosed**: a ledger was ingested; the accounts it touched have
//!   new aggregates. An empty account list means "anything may have changed".

use super::AccountHistoryCache;
use crate::types::AccountId;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionEvent {
    LedgerClosed {
        sequence: u32,
        accounts: Vec<AccountId>,
    },
}

/// Background task that invalidates cached aggregates after ingestion.
pub struct InvalidationListener {
    cache: Arc<AccountHistoryCache>,
    events: broadcast::Receiver<IngestionEvent>,
}

impl InvalidationListener {
    /// Creates a new invalidation listener
    ///
    /// # Arguments
    /// * `cache` - Cache whose entries are dropped on ledger close
    /// * `events` - Receiving end of the ingestion event channel
    pub fn new(cache: Arc<AccountHistoryCache>, events: broadcast::Receiver<IngestionEvent>) -> Self {
        Self { cache, events }
    }

    /// Runs until the sending side is dropped.
    ///
    /// A lagged receiver has lost events it cannot recover, so the whole
    /// cache is dropped instead.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            match self.events.recv().await {
                Ok(event) => self.handle(event).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Ingestion listener lagged by {} events, clearing cache", missed);
                    self.cache.invalidate_all().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Ingestion event channel closed, listener stopping");
                    return Ok(());
                }
            }
        }
    }

    async fn handle(&self, event: IngestionEvent) {
        match event {
            IngestionEvent::LedgerClosed { sequence, accounts } if accounts.is_empty() => {
                debug!("Ledger {} closed without account list, clearing cache", sequence);
                self.cache.invalidate_all().await;
            }
            IngestionEvent::LedgerClosed { sequence, accounts } => {
                debug!("Ledger {} closed, invalidating {} accounts", sequence, accounts.len());
                self.cache.invalidate_many(&accounts).await;
            }
        }
    }
}

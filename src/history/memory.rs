use super::HistoryStore;
use crate::error::StoreError;
use crate::types::{AccountId, HistoricalAggregate};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory history store.
#[derive(Clone, Default)]
pub struct MemoryHistory {
    aggregates: Arc<RwLock<HashMap<AccountId, HistoricalAggregate>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, aggregate: HistoricalAggregate) {
        let mut aggregates = self.aggregates.write().await;
        aggregates.insert(aggregate.account_id.clone(), aggregate);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("history store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn account_aggregate(&self, id: &AccountId) -> Result<HistoricalAggregate, StoreError> {
        self.check_available()?;
        let aggregates = self.aggregates.read().await;
        Ok(aggregates
            .get(id)
            .cloned()
            .unwrap_or_else(|| HistoricalAggregate::empty(id.clone())))
    }

    async fn latest_ledger(&self) -> Result<u32, StoreError> {
        self.check_available()?;
        let aggregates = self.aggregates.read().await;
        Ok(aggregates.values().map(|a| a.ledger).max().unwrap_or(0))
    }

    async fn changed_since(&self, after: u32) -> Result<Vec<(u32, AccountId)>, StoreError> {
        self.check_available()?;
        let aggregates = self.aggregates.read().await;
        let mut changed: Vec<_> = aggregates
            .values()
            .filter(|a| a.ledger > after)
            .map(|a| (a.ledger, a.account_id.clone()))
            .collect();
        changed.sort();
        Ok(changed)
    }
}

use super::HistoryStore;
use crate::error::StoreError;
use crate::types::{AccountId, HistoricalAggregate};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

type Slot = Arc<OnceCell<Arc<HistoricalAggregate>>>;

/// Accounts kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Counters exposed for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls that reached the backing store.
    pub loads: u64,
    pub invalidations: u64,
    /// Slots dropped to stay within capacity.
    pub evictions: u64,
}

/// Read-through cache in front of a [`HistoryStore`].
///
/// Every account gets a slot holding a `OnceCell`. Concurrent misses on the
/// same account wait on that cell, so only one of them reaches the store.
/// Invalidation drops the slot from the map; a load still running on a
/// dropped slot finishes into a cell nobody will look up again, so its
/// (possibly stale) value never becomes visible to later lookups.
///
/// Slots live in an LRU bounded by the configured capacity. Eviction is
/// indistinguishable from invalidation for callers: the next lookup loads.
#[derive(Clone)]
pub struct AccountHistoryCache {
    store: Arc<dyn HistoryStore>,
    slots: Arc<Mutex<LruCache<AccountId, Slot>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    loads: Arc<AtomicU64>,
    invalidations: Arc<AtomicU64>,
    evictions: Arc<AtomicU64>,
}

impl AccountHistoryCache {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self::with_capacity(store, DEFAULT_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` accounts (at least one).
    pub fn with_capacity(store: Arc<dyn HistoryStore>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            slots: Arc::new(Mutex::new(LruCache::new(capacity))),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            loads: Arc::new(AtomicU64::new(0)),
            invalidations: Arc::new(AtomicU64::new(0)),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the aggregate for `id`, loading it on a miss.
    ///
    /// # Arguments
    /// * `id` - Account whose historical rollups are wanted
    ///
    /// # Returns
    /// * `Ok(aggregate)` - Cached value, or the value just loaded
    /// * `Err(StoreError)` - The load failed; the slot is dropped so the
    ///   next lookup tries again
    pub async fn get(&self, id: &AccountId) -> Result<Arc<HistoricalAggregate>, StoreError> {
        let slot = self.slot(id).await;

        if let Some(aggregate) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(aggregate.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let loaded = slot
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::Relaxed);
                debug!("Loading history aggregate for {}", id);
                self.store.account_aggregate(id).await.map(Arc::new)
            })
            .await;

        match loaded {
            Ok(aggregate) => Ok(aggregate.clone()),
            Err(e) => {
                self.discard_empty(id, &slot).await;
                Err(e)
            }
        }
    }

    async fn slot(&self, id: &AccountId) -> Slot {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get(id) {
            return slot.clone();
        }

        let slot: Slot = Arc::new(OnceCell::new());
        if let Some((evicted, _)) = slots.push(id.clone(), slot.clone()) {
            // `push` hands back the replaced entry too; only a different key is an eviction
            if &evicted != id {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        slot
    }

    /// Drops `slot` if it is still the one mapped to `id` and never filled.
    async fn discard_empty(&self, id: &AccountId, slot: &Slot) {
        let mut slots = self.slots.lock().await;
        let current = slots
            .peek(id)
            .is_some_and(|mapped| Arc::ptr_eq(mapped, slot) && !mapped.initialized());
        if current {
            slots.pop(id);
        }
    }

    pub async fn invalidate(&self, id: &AccountId) {
        if self.slots.lock().await.pop(id).is_some() {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub async fn invalidate_many(&self, ids: &[AccountId]) {
        let mut slots = self.slots.lock().await;
        for id in ids {
            if slots.pop(id).is_some() {
                self.invalidations.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub async fn invalidate_all(&self) {
        let mut slots = self.slots.lock().await;
        self.invalidations
            .fetch_add(slots.len() as u64, Ordering::Relaxed);
        slots.clear();
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::history::MemoryHistory;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Store that counts loads and answers slowly, to widen race windows.
    struct SlowStore {
        inner: MemoryHistory,
        loads: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl HistoryStore for SlowStore {
        async fn account_aggregate(&self, id: &AccountId) -> Result<HistoricalAggregate, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inner.account_aggregate(id).await
        }

        async fn latest_ledger(&self) -> Result<u32, StoreError> {
            self.inner.latest_ledger().await
        }

        async fn changed_since(&self, after: u32) -> Result<Vec<(u32, AccountId)>, StoreError> {
            self.inner.changed_since(after).await
        }
    }

    fn aggregate(id: &str, daily: i64) -> HistoricalAggregate {
        let mut aggregate = HistoricalAggregate::empty(AccountId::new(id));
        aggregate.daily_outcome = Amount::from_whole(daily).unwrap();
        aggregate
    }

    fn slow_store(inner: MemoryHistory) -> Arc<SlowStore> {
        Arc::new(SlowStore {
            inner,
            loads: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        })
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let history = MemoryHistory::new();
        history.put(aggregate("GA", 400)).await;
        let cache = AccountHistoryCache::new(Arc::new(history));
        let id = AccountId::new("GA");

        let first = cache.get(&id).await.unwrap();
        let second = cache.get(&id).await.unwrap();
        assert_eq!(first.daily_outcome, Amount::from_whole(400).unwrap());
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_into_one_load() {
        let history = MemoryHistory::new();
        history.put(aggregate("GA", 400)).await;
        let store = slow_store(history);
        let cache = AccountHistoryCache::new(store.clone());
        let id = AccountId::new("GA");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move { cache.get(&id).await.unwrap() }));
        }
        for handle in handles {
            let aggregate = handle.await.unwrap();
            assert_eq!(aggregate.daily_outcome, Amount::from_whole(400).unwrap());
        }

        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().loads, 1);
    }

    #[tokio::test]
    async fn test_different_keys_load_independently() {
        let history = MemoryHistory::new();
        let store = slow_store(history);
        let cache = AccountHistoryCache::new(store.clone());

        let a = AccountId::new("GA");
        let b = AccountId::new("GB");
        let (ra, rb) = tokio::join!(cache.get(&a), cache.get(&b));
        assert_eq!(ra.unwrap().account_id, a);
        assert_eq!(rb.unwrap().account_id, b);
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_exposes_refreshed_value() {
        let history = MemoryHistory::new();
        history.put(aggregate("GA", 400)).await;
        let cache = AccountHistoryCache::new(Arc::new(history.clone()));
        let id = AccountId::new("GA");

        assert_eq!(cache.get(&id).await.unwrap().daily_outcome, Amount::from_whole(400).unwrap());

        // Ingestion wrote a new aggregate; until invalidated the cache still serves the old one
        history.put(aggregate("GA", 450)).await;
        assert_eq!(cache.get(&id).await.unwrap().daily_outcome, Amount::from_whole(400).unwrap());

        cache.invalidate(&id).await;
        assert_eq!(cache.get(&id).await.unwrap().daily_outcome, Amount::from_whole(450).unwrap());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn test_load_started_before_invalidation_is_not_kept() {
        let history = MemoryHistory::new();
        history.put(aggregate("GA", 400)).await;
        let store = slow_store(history.clone());
        let cache = AccountHistoryCache::new(store.clone());
        let id = AccountId::new("GA");

        let in_flight = {
            let cache = cache.clone();
            let id = id.clone();
            tokio::spawn(async move { cache.get(&id).await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        history.put(aggregate("GA", 450)).await;
        cache.invalidate(&id).await;

        in_flight.await.unwrap();
        let fresh = cache.get(&id).await.unwrap();
        assert_eq!(fresh.daily_outcome, Amount::from_whole(450).unwrap());
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let history = MemoryHistory::new();
        history.set_unavailable(true);
        let cache = AccountHistoryCache::new(Arc::new(history.clone()));
        let id = AccountId::new("GA");

        assert!(matches!(cache.get(&id).await, Err(StoreError::Unavailable(_))));

        history.set_unavailable(false);
        assert!(cache.get(&id).await.is_ok());
        assert_eq!(cache.stats().loads, 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = AccountHistoryCache::new(Arc::new(MemoryHistory::new()));
        cache.get(&AccountId::new("GA")).await.unwrap();
        cache.get(&AccountId::new("GB")).await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.invalidate_all().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[tokio::test]
    async fn test_never_grows_past_capacity() {
        let cache = AccountHistoryCache::with_capacity(Arc::new(MemoryHistory::new()), 3);
        for n in 0..50 {
            cache.get(&AccountId::new(format!("G{n}"))).await.unwrap();
            assert!(cache.len().await <= 3);
        }
        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.stats().evictions, 47);
    }

    #[tokio::test]
    async fn test_recently_used_account_survives_eviction() {
        let history = MemoryHistory::new();
        let cache = AccountHistoryCache::with_capacity(Arc::new(history), 2);
        let a = AccountId::new("GA");

        cache.get(&a).await.unwrap();
        cache.get(&AccountId::new("GB")).await.unwrap();
        cache.get(&a).await.unwrap();
        cache.get(&AccountId::new("GC")).await.unwrap();

        // GB was the least recently used
        cache.get(&a).await.unwrap();
        assert_eq!(cache.stats().loads, 3);
    }

    #[tokio::test]
    async fn test_failed_loads_leave_no_slots() {
        let history = MemoryHistory::new();
        history.set_unavailable(true);
        let cache = AccountHistoryCache::new(Arc::new(history));

        for n in 0..20 {
            assert!(cache.get(&AccountId::new(format!("G{n}"))).await.is_err());
        }
        assert!(cache.is_empty().await);
    }
}

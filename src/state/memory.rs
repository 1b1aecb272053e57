use super::LedgerState;
use crate::error::StoreError;
use crate::types::{AccountEntry, AccountId, Asset, DataEntry, LedgerHeader, OfferEntry, TrustLineEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Entries {
    accounts: HashMap<AccountId, AccountEntry>,
    trustlines: HashMap<(AccountId, Asset), TrustLineEntry>,
    offers: HashMap<u64, OfferEntry>,
    data: HashMap<(AccountId, String), DataEntry>,
}

/// In-memory ledger mirror.
///
/// Cheap to clone; clones share the same entries. Writers are the component
/// that keeps the mirror in sync, never the validation engine.
#[derive(Clone)]
pub struct MemoryLedger {
    header: Arc<RwLock<LedgerHeader>>,
    entries: Arc<RwLock<Entries>>,
    /// When set, every query fails as if the backend were down.
    unavailable: Arc<RwLock<bool>>,
}

impl MemoryLedger {
    pub fn new(header: LedgerHeader) -> Self {
        Self {
            header: Arc::new(RwLock::new(header)),
            entries: Arc::new(RwLock::new(Entries::default())),
            unavailable: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn set_header(&self, header: LedgerHeader) {
        *self.header.write().await = header;
    }

    pub async fn put_account(&self, account: AccountEntry) {
        let mut entries = self.entries.write().await;
        entries.accounts.insert(account.account_id.clone(), account);
    }

    pub async fn put_trustline(&self, line: TrustLineEntry) {
        let mut entries = self.entries.write().await;
        entries
            .trustlines
            .insert((line.account_id.clone(), line.asset.clone()), line);
    }

    pub async fn put_offer(&self, offer: OfferEntry) {
        let mut entries = self.entries.write().await;
        entries.offers.insert(offer.offer_id, offer);
    }

    pub async fn put_data(&self, data: DataEntry) {
        let mut entries = self.entries.write().await;
        entries
            .data
            .insert((data.account_id.clone(), data.name.clone()), data);
    }

    pub async fn remove_account(&self, id: &AccountId) {
        self.entries.write().await.accounts.remove(id);
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    async fn ensure_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.read().await {
            return Err(StoreError::Unavailable("ledger mirror offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerState for MemoryLedger {
    async fn ledger_header(&self) -> Result<LedgerHeader, StoreError> {
        self.ensure_available().await?;
        Ok(self.header.read().await.clone())
    }

    async fn account(&self, id: &AccountId) -> Result<Option<AccountEntry>, StoreError> {
        self.ensure_available().await?;
        Ok(self.entries.read().await.accounts.get(id).cloned())
    }

    async fn trustline(
        &self,
        account: &AccountId,
        asset: &Asset,
    ) -> Result<Option<TrustLineEntry>, StoreError> {
        self.ensure_available().await?;
        if asset.is_native() {
            return Ok(None);
        }
        let entries = self.entries.read().await;
        Ok(entries
            .trustlines
            .get(&(account.clone(), asset.clone()))
            .cloned())
    }

    async fn offer(&self, offer_id: u64) -> Result<Option<OfferEntry>, StoreError> {
        self.ensure_available().await?;
        Ok(self.entries.read().await.offers.get(&offer_id).cloned())
    }

    async fn data(&self, account: &AccountId, name: &str) -> Result<Option<DataEntry>, StoreError> {
        self.ensure_available().await?;
        let entries = self.entries.read().await;
        Ok(entries
            .data
            .get(&(account.clone(), name.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;

    fn header() -> LedgerHeader {
        LedgerHeader {
            sequence: 10,
            close_time: 1_700_000_000,
            base_fee: 100,
            base_reserve: Amount::from_units(5_000_000),
            inflation_seq: 0,
            max_tx_set_size: 100,
        }
    }

    #[tokio::test]
    async fn test_put_and_query() {
        let ledger = MemoryLedger::new(header());
        let id = AccountId::new("GA");
        assert_eq!(ledger.account(&id).await.unwrap(), None);

        ledger
            .put_account(AccountEntry::new(id.clone(), Amount::from_whole(10).unwrap(), 7))
            .await;
        let account = ledger.account(&id).await.unwrap().unwrap();
        assert_eq!(account.seq_num, 7);

        assert_eq!(ledger.trustline(&id, &Asset::Native).await.unwrap(), None);
        assert_eq!(ledger.ledger_header().await.unwrap().sequence, 10);
    }

    #[tokio::test]
    async fn test_unavailable_backend_errors() {
        let ledger = MemoryLedger::new(header());
        ledger.set_unavailable(true).await;
        let err = ledger.account(&AccountId::new("GA")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}

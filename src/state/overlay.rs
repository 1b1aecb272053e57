use super::LedgerState;
use crate::amount::Amount;
use crate::error::StoreError;
use crate::types::{AccountEntry, AccountId, Asset, DataEntry, OfferEntry, TrustLineEntry};
use std::collections::HashMap;

/// A change a successful operation makes, as seen by later operations of the
/// same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PutAccount(AccountEntry),
    DeleteAccount(AccountId),
    PutTrustLine(TrustLineEntry),
    DeleteTrustLine(AccountId, Asset),
    PutOffer(OfferEntry),
    DeleteOffer(u64),
    PutData(DataEntry),
    DeleteData(AccountId, String),
    /// Amount leaving the account, counted against its outcome limits.
    Outcome(AccountId, Amount),
    /// Amount arriving at the account, counted against its income limit.
    Income(AccountId, Amount),
}

/// Outcome and income an account has accumulated within the transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFlow {
    pub outcome: Amount,
    pub income: Amount,
}

/// Per-transaction view of the ledger.
///
/// Reads fall through to the backing [`LedgerState`] unless an earlier
/// operation already changed the entry. `None` in an override map marks a
/// deleted entry. Nothing is ever written back.
pub struct StateOverlay<'a> {
    ledger: &'a dyn LedgerState,
    accounts: HashMap<AccountId, Option<AccountEntry>>,
    trustlines: HashMap<(AccountId, Asset), Option<TrustLineEntry>>,
    offers: HashMap<u64, Option<OfferEntry>>,
    data: HashMap<(AccountId, String), Option<DataEntry>>,
    flows: HashMap<AccountId, PendingFlow>,
}

impl<'a> StateOverlay<'a> {
    pub fn new(ledger: &'a dyn LedgerState) -> Self {
        Self {
            ledger,
            accounts: HashMap::new(),
            trustlines: HashMap::new(),
            offers: HashMap::new(),
            data: HashMap::new(),
            flows: HashMap::new(),
        }
    }

    pub async fn account(&self, id: &AccountId) -> Result<Option<AccountEntry>, StoreError> {
        match self.accounts.get(id) {
            Some(entry) => Ok(entry.clone()),
            None => self.ledger.account(id).await,
        }
    }

    pub async fn trustline(
        &self,
        account: &AccountId,
        asset: &Asset,
    ) -> Result<Option<TrustLineEntry>, StoreError> {
        if asset.is_native() {
            return Ok(None);
        }
        match self.trustlines.get(&(account.clone(), asset.clone())) {
            Some(entry) => Ok(entry.clone()),
            None => self.ledger.trustline(account, asset).await,
        }
    }

    pub async fn offer(&self, offer_id: u64) -> Result<Option<OfferEntry>, StoreError> {
        match self.offers.get(&offer_id) {
            Some(entry) => Ok(entry.clone()),
            None => self.ledger.offer(offer_id).await,
        }
    }

    pub async fn data(&self, account: &AccountId, name: &str) -> Result<Option<DataEntry>, StoreError> {
        match self.data.get(&(account.clone(), name.to_string())) {
            Some(entry) => Ok(entry.clone()),
            None => self.ledger.data(account, name).await,
        }
    }

    pub fn pending(&self, id: &AccountId) -> PendingFlow {
        self.flows.get(id).copied().unwrap_or_default()
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.apply_one(effect);
        }
    }

    fn apply_one(&mut self, effect: Effect) {
        match effect {
            Effect::PutAccount(entry) => {
                self.accounts.insert(entry.account_id.clone(), Some(entry));
            }
            Effect::DeleteAccount(id) => {
                self.accounts.insert(id, None);
            }
            Effect::PutTrustLine(line) => {
                let key = (line.account_id.clone(), line.asset.clone());
                self.trustlines.insert(key, Some(line));
            }
            Effect::DeleteTrustLine(account, asset) => {
                self.trustlines.insert((account, asset), None);
            }
            Effect::PutOffer(offer) => {
                self.offers.insert(offer.offer_id, Some(offer));
            }
            Effect::DeleteOffer(offer_id) => {
                self.offers.insert(offer_id, None);
            }
            Effect::PutData(entry) => {
                let key = (entry.account_id.clone(), entry.name.clone());
                self.data.insert(key, Some(entry));
            }
            Effect::DeleteData(account, name) => {
                self.data.insert((account, name), None);
            }
            Effect::Outcome(id, amount) => {
                let flow = self.flows.entry(id).or_default();
                flow.outcome = flow.outcome.saturating_add(amount);
            }
            Effect::Income(id, amount) => {
                let flow = self.flows.entry(id).or_default();
                flow.income = flow.income.saturating_add(amount);
            }
        }
    }
}

use crate::amount::Amount;
use crate::error::StoreError;
use crate::history::AccountHistoryCache;
use crate::restrictions::{AccountClass, Delta, RestrictionPolicy, Threshold, Verdict};
use crate::state::StateOverlay;
use crate::transaction::{OperationFrame, TransactionFrame};
use crate::types::{AccountEntry, AccountId, Asset, LedgerHeader, TrustLineEntry};
use tracing::debug;

/// Everything an operation validator may look at.
///
/// State reads go through the transaction's overlay, so an operation sees
/// the effects of the operations before it.
pub struct OperationContext<'a> {
    pub(crate) tx: &'a TransactionFrame,
    pub(crate) op: &'a OperationFrame,
    pub(crate) header: &'a LedgerHeader,
    pub(crate) state: &'a StateOverlay<'a>,
    pub(crate) history: &'a AccountHistoryCache,
    pub(crate) policy: &'a RestrictionPolicy,
}

impl<'a> OperationContext<'a> {
    pub fn operation(&self) -> &OperationFrame {
        self.op
    }

    pub fn source_id(&self) -> &AccountId {
        self.op.source_account()
    }

    pub fn header(&self) -> &LedgerHeader {
        self.header
    }

    pub fn base_reserve(&self) -> Amount {
        self.header.base_reserve
    }

    pub fn state(&self) -> &StateOverlay<'a> {
        self.state
    }

    pub async fn account(&self, id: &AccountId) -> Result<Option<AccountEntry>, StoreError> {
        self.state.account(id).await
    }

    pub async fn trustline(
        &self,
        account: &AccountId,
        asset: &Asset,
    ) -> Result<Option<TrustLineEntry>, StoreError> {
        self.state.trustline(account, asset).await
    }

    /// Checks `delta` against the policy for an existing account.
    pub async fn restriction(
        &self,
        account: &AccountEntry,
        delta: Delta,
    ) -> Result<Option<Threshold>, StoreError> {
        self.restriction_for(&account.account_id, AccountClass::of(account), delta)
            .await
    }

    /// Checks `delta` for `id` in class `class`.
    ///
    /// History is only loaded for anonymous accounts. The cached aggregate
    /// is projected to the submission time and topped up with what earlier
    /// operations of this transaction already moved.
    pub async fn restriction_for(
        &self,
        id: &AccountId,
        class: AccountClass,
        delta: Delta,
    ) -> Result<Option<Threshold>, StoreError> {
        if class != AccountClass::Anonymous {
            return Ok(None);
        }

        let cached = self.history.get(id).await?;
        let mut aggregate = cached.project(self.tx.submitted_at());
        let pending = self.state.pending(id);
        aggregate.daily_outcome = aggregate.daily_outcome.saturating_add(pending.outcome);
        aggregate.monthly_outcome = aggregate.monthly_outcome.saturating_add(pending.outcome);
        aggregate.annual_outcome = aggregate.annual_outcome.saturating_add(pending.outcome);
        aggregate.annual_income = aggregate.annual_income.saturating_add(pending.income);

        match self.policy.check(class, &delta, &aggregate) {
            Verdict::Allowed => Ok(None),
            Verdict::Exceeded(threshold) => {
                debug!("Restriction {} exceeded for {}", threshold, id);
                Ok(Some(threshold))
            }
        }
    }
}

//! Operation Validators
//!
//! One module per operation kind. Every validator is a plain async function
//! taking the context, the source account and its typed arguments, and
//! returning the protocol result plus the effects later operations must see.
//! [`validate`] is the single dispatch point over [`OperationBody`].

mod account_merge;
mod allow_trust;
mod bump_sequence;
mod change_trust;
mod create_account;
mod inflation;
mod manage_data;
mod offer;
mod path_payment;
mod payment;
mod set_options;

use super::context::OperationContext;
use crate::amount::Amount;
use crate::error::{StoreError, ValidationError};
use crate::results::OperationResult;
use crate::state::Effect;
use crate::transaction::OperationBody;
use crate::types::{AccountEntry, Asset, TrustLineEntry};

/// What validating one operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub result: OperationResult,
    /// Empty unless the operation succeeded.
    pub effects: Vec<Effect>,
}

impl OperationOutcome {
    pub fn success(result: impl Into<OperationResult>, effects: Vec<Effect>) -> Self {
        Self {
            result: result.into(),
            effects,
        }
    }

    pub fn failed(result: impl Into<OperationResult>) -> Self {
        Self {
            result: result.into(),
            effects: Vec::new(),
        }
    }
}

/// Validates the operation in `ctx`.
///
/// The source account is resolved here once; a missing source is reported
/// the same way for every kind.
pub async fn validate(ctx: &OperationContext<'_>) -> Result<OperationOutcome, ValidationError> {
    let Some(source) = ctx.account(ctx.source_id()).await? else {
        return Ok(OperationOutcome::failed(OperationResult::NoAccount));
    };

    let outcome = match ctx.operation().body() {
        OperationBody::CreateAccount(op) => create_account::validate(ctx, &source, op).await?,
        OperationBody::Payment(op) => payment::validate(ctx, &source, op).await?,
        OperationBody::PathPayment(op) => path_payment::validate(ctx, &source, op).await?,
        OperationBody::ManageOffer(op) => offer::validate_manage(ctx, &source, op).await?,
        OperationBody::CreatePassiveOffer(op) => offer::validate_passive(ctx, &source, op).await?,
        OperationBody::SetOptions(op) => set_options::validate(ctx, &source, op).await?,
        OperationBody::ChangeTrust(op) => change_trust::validate(ctx, &source, op).await?,
        OperationBody::AllowTrust(op) => allow_trust::validate(ctx, &source, op).await?,
        OperationBody::AccountMerge(op) => account_merge::validate(ctx, &source, op).await?,
        OperationBody::Inflation => inflation::validate(ctx),
        OperationBody::ManageData(op) => manage_data::validate(ctx, &source, op).await?,
        OperationBody::BumpSequence(op) => bump_sequence::validate(&source, op),
    };

    Ok(outcome)
}

/// Where an account keeps its balance of one asset.
#[derive(Debug, Clone)]
pub(crate) enum Holding {
    Native(AccountEntry),
    Line(TrustLineEntry),
    /// The account issued the asset and can send or take any amount.
    Issuer,
}

impl Holding {
    /// `None` if the account needs a trustline for `asset` and has none.
    pub(crate) async fn load(
        ctx: &OperationContext<'_>,
        account: &AccountEntry,
        asset: &Asset,
    ) -> Result<Option<Holding>, StoreError> {
        match asset {
            Asset::Native => Ok(Some(Holding::Native(account.clone()))),
            Asset::Credit { issuer, .. } if *issuer == account.account_id => Ok(Some(Holding::Issuer)),
            Asset::Credit { .. } => Ok(ctx
                .trustline(&account.account_id, asset)
                .await?
                .map(Holding::Line)),
        }
    }

    pub(crate) fn is_authorized(&self) -> bool {
        match self {
            Holding::Line(line) => line.authorized,
            Holding::Native(_) | Holding::Issuer => true,
        }
    }

    pub(crate) fn available_to_send(&self, base_reserve: Amount) -> Amount {
        match self {
            Holding::Native(account) => account.available_to_send(base_reserve),
            Holding::Line(line) => line.available_to_send(),
            Holding::Issuer => Amount::MAX,
        }
    }

    pub(crate) fn available_to_receive(&self) -> Amount {
        match self {
            Holding::Native(account) => account.available_to_receive(),
            Holding::Line(line) => line.available_to_receive(),
            Holding::Issuer => Amount::MAX,
        }
    }

    /// Current balance. Issuers have none.
    pub(crate) fn balance(&self) -> Option<Amount> {
        match self {
            Holding::Native(account) => Some(account.balance),
            Holding::Line(line) => Some(line.balance),
            Holding::Issuer => None,
        }
    }

    /// Effect of adding `delta` (negative to debit) to the balance.
    pub(crate) fn adjust(&self, delta: Amount) -> Option<Effect> {
        match self {
            Holding::Native(account) => {
                let mut account = account.clone();
                account.balance = account.balance.saturating_add(delta);
                Some(Effect::PutAccount(account))
            }
            Holding::Line(line) => {
                let mut line = line.clone();
                line.balance = line.balance.saturating_add(delta);
                Some(Effect::PutTrustLine(line))
            }
            Holding::Issuer => None,
        }
    }
}

/// Whether the issuer of a credit asset still exists. Native always does.
pub(crate) async fn issuer_exists(
    ctx: &OperationContext<'_>,
    asset: &Asset,
) -> Result<bool, StoreError> {
    match asset.issuer() {
        None => Ok(true),
        Some(issuer) => Ok(ctx.account(issuer).await?.is_some()),
    }
}

/// Negates an amount for use as a debit.
pub(crate) fn debit(amount: Amount) -> Amount {
    Amount::ZERO.saturating_sub(amount)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::history::{AccountHistoryCache, MemoryHistory};
    use crate::restrictions::RestrictionPolicy;
    use crate::state::{LedgerState, MemoryLedger, StateOverlay};
    use crate::transaction::{Operation, TransactionEnvelope, TransactionFrame};
    use crate::types::{AccountId, LedgerHeader};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    pub fn whole(n: i64) -> Amount {
        Amount::from_whole(n).unwrap()
    }

    pub fn id(name: &str) -> AccountId {
        AccountId::new(name)
    }

    pub fn usd() -> Asset {
        Asset::credit("USD", id("GISSUER"))
    }

    pub fn header() -> LedgerHeader {
        LedgerHeader {
            sequence: 100,
            close_time: 1_700_000_000,
            base_fee: 100,
            base_reserve: whole(10),
            inflation_seq: 0,
            max_tx_set_size: 100,
        }
    }

    pub fn account(name: &str, balance: i64) -> AccountEntry {
        AccountEntry::new(id(name), whole(balance), 1)
    }

    pub fn line(owner: &str, asset: Asset, balance: i64, limit: i64) -> TrustLineEntry {
        TrustLineEntry {
            account_id: id(owner),
            asset,
            balance: whole(balance),
            limit: whole(limit),
            authorized: true,
            liabilities: Default::default(),
        }
    }

    /// Ledger plus history backing a single-operation run.
    pub struct Harness {
        pub ledger: MemoryLedger,
        pub history: MemoryHistory,
        pub policy: RestrictionPolicy,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                ledger: MemoryLedger::new(header()),
                history: MemoryHistory::new(),
                policy: RestrictionPolicy::unlimited(),
            }
        }

        pub async fn with_accounts(accounts: Vec<AccountEntry>) -> Self {
            let harness = Self::new();
            for account in accounts {
                harness.ledger.put_account(account).await;
            }
            harness
        }

        /// Runs one operation with source `GA` against a fresh overlay.
        pub async fn run(&self, op: Operation) -> OperationOutcome {
            self.try_run(op).await.unwrap()
        }

        pub async fn try_run(&self, op: Operation) -> Result<OperationOutcome, ValidationError> {
            let envelope = TransactionEnvelope {
                source_account: id("GA"),
                fee: 100,
                seq_num: 2,
                time_bounds: None,
                memo: Default::default(),
                operations: vec![op],
                signatures: Vec::new(),
            };
            let submitted_at = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
            let frame = TransactionFrame::new(envelope, submitted_at);
            let header = self.ledger.ledger_header().await?;
            let overlay = StateOverlay::new(&self.ledger);
            let cache = AccountHistoryCache::new(Arc::new(self.history.clone()));
            let ctx = OperationContext {
                tx: &frame,
                op: &frame.operations()[0],
                header: &header,
                state: &overlay,
                history: &cache,
                policy: &self.policy,
            };
            validate(&ctx).await
        }
    }
}

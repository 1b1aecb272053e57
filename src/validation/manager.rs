use super::cancel::Cancellation;
use super::context::OperationContext;
use super::operations;
use crate::amount::Amount;
use crate::error::ValidationError;
use crate::history::AccountHistoryCache;
use crate::restrictions::RestrictionPolicy;
use crate::results::{OperationResult, TransactionResultCode, ValidationResult};
use crate::state::{Effect, LedgerState, StateOverlay};
use crate::transaction::TransactionFrame;
use crate::types::LedgerHeader;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs transaction-level checks and then every operation in order.
pub struct ValidationManager {
    ledger: Arc<dyn LedgerState>,
    cache: Arc<AccountHistoryCache>,
    policy: RestrictionPolicy,
}

impl ValidationManager {
    /// Creates a manager shared by every request
    ///
    /// # Arguments
    /// * `ledger` - Read access to the mirrored ledger state
    /// * `cache` - History cache consulted by restriction checks
    /// * `policy` - Limits for anonymous accounts, fixed for the process
    pub fn new(
        ledger: Arc<dyn LedgerState>,
        cache: Arc<AccountHistoryCache>,
        policy: RestrictionPolicy,
    ) -> Self {
        Self {
            ledger,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &AccountHistoryCache {
        &self.cache
    }

    pub async fn validate(
        &self,
        frame: &mut TransactionFrame,
    ) -> Result<ValidationResult, ValidationError> {
        self.validate_with_cancel(frame, &Cancellation::never()).await
    }

    /// Validates `frame`, recording per-operation results on it.
    ///
    /// # Validation Steps
    /// 1. Transaction-level checks: structure, source, sequence, fee, time
    ///    bounds, fee balance. A failure here leaves every operation not
    ///    attempted.
    /// 2. Operations in order against one overlay, so each sees what the
    ///    earlier ones did. The first failure stops the run and the rest
    ///    are marked not attempted.
    ///
    /// # Arguments
    /// * `frame` - The transaction; its result slots are overwritten
    /// * `cancel` - Checked before every operation
    ///
    /// # Returns
    /// * `Ok(result)` - The verdict, also recorded on `frame`
    /// * `Err(ValidationError)` - The outcome is unknown, never that the
    ///   transaction is invalid
    pub async fn validate_with_cancel(
        &self,
        frame: &mut TransactionFrame,
        cancel: &Cancellation,
    ) -> Result<ValidationResult, ValidationError> {
        debug!(
            "Validating transaction {}:{} with {} operations",
            frame.source_account(),
            frame.seq_num(),
            frame.operations().len()
        );
        frame.reset();

        let header = self.ledger.ledger_header().await?;
        let mut overlay = StateOverlay::new(self.ledger.as_ref());
        let op_count = frame.operations().len();

        // 1. Transaction-level checks
        if let Some(code) = self.check_transaction(frame, &header, &mut overlay).await? {
            debug!("Transaction {}:{} rejected: {}", frame.source_account(), frame.seq_num(), code);
            let result = ValidationResult::rejected(code, op_count);
            record(frame, &result);
            return Ok(result);
        }

        // 2. Operations, stopping at the first failure
        let mut results = Vec::with_capacity(op_count);
        for op in frame.operations() {
            if cancel.is_cancelled() {
                warn!(
                    "Validation of {}:{} cancelled at operation {}",
                    frame.source_account(),
                    frame.seq_num(),
                    op.index()
                );
                return Err(ValidationError::Cancelled);
            }

            let ctx = OperationContext {
                tx: &*frame,
                op,
                header: &header,
                state: &overlay,
                history: &self.cache,
                policy: &self.policy,
            };
            let outcome = operations::validate(&ctx).await?;
            debug!("Operation {} ({:?}): {}", op.index(), op.body().kind(), outcome.result.as_str());

            results.push(outcome.result);
            if !outcome.result.is_success() {
                break;
            }
            overlay.apply(outcome.effects);
        }
        results.resize(op_count, OperationResult::NotAttempted);

        let result = ValidationResult::from_operations(results);
        record(frame, &result);
        Ok(result)
    }

    /// Returns the rejection code, if any. On success the fee and sequence
    /// number are charged to the source in `overlay`.
    async fn check_transaction(
        &self,
        frame: &TransactionFrame,
        header: &LedgerHeader,
        overlay: &mut StateOverlay<'_>,
    ) -> Result<Option<TransactionResultCode>, ValidationError> {
        if !frame.envelope().is_well_formed() {
            return Ok(Some(TransactionResultCode::TxMalformed));
        }

        let Some(mut source) = overlay.account(frame.source_account()).await? else {
            return Ok(Some(TransactionResultCode::TxNoAccount));
        };

        if source.seq_num.checked_add(1) != Some(frame.seq_num()) {
            warn!(
                "Sequence check failed for {}: expected {}, got {}",
                source.account_id,
                source.seq_num.saturating_add(1),
                frame.seq_num()
            );
            return Ok(Some(TransactionResultCode::TxBadSeq));
        }

        let min_fee = header
            .base_fee
            .saturating_mul(frame.operations().len() as i64);
        if frame.fee() < 0 || frame.fee() < min_fee {
            return Ok(Some(TransactionResultCode::TxInsufficientFee));
        }

        if let Some(bounds) = frame.envelope().time_bounds {
            let now = frame.submitted_at().timestamp();
            if bounds.min_time > now {
                return Ok(Some(TransactionResultCode::TxTooEarly));
            }
            if bounds.max_time != 0 && bounds.max_time < now {
                return Ok(Some(TransactionResultCode::TxTooLate));
            }
        }

        let fee = Amount::from_units(frame.fee());
        if source.available_to_send(header.base_reserve) < fee {
            return Ok(Some(TransactionResultCode::TxInsufficientBalance));
        }

        source.balance = source.balance.saturating_sub(fee);
        source.seq_num = frame.seq_num();
        overlay.apply(vec![Effect::PutAccount(source)]);
        Ok(None)
    }
}

fn record(frame: &mut TransactionFrame, result: &ValidationResult) {
    for (op, op_result) in frame.operations_mut().iter_mut().zip(&result.operations) {
        op.set_result(*op_result);
    }
    frame.record_result(result.clone());
}

use super::OperationOutcome;
use crate::amount::Amount;
use crate::error::ValidationError;
use crate::results::{ChangeTrustResultCode, OperationInnerResult};
use crate::state::Effect;
use crate::transaction::ChangeTrustOp;
use crate::types::{AccountEntry, Liabilities, TrustLineEntry, AUTH_REQUIRED_FLAG};
use crate::validation::context::OperationContext;

fn fail(code: ChangeTrustResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::ChangeTrust(code))
}

fn success(effects: Vec<Effect>) -> OperationOutcome {
    OperationOutcome::success(OperationInnerResult::ChangeTrust(ChangeTrustResultCode::Success), effects)
}

pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &ChangeTrustOp,
) -> Result<OperationOutcome, ValidationError> {
    let Some(issuer_id) = op.line.issuer() else {
        return Ok(fail(ChangeTrustResultCode::Malformed));
    };
    if !op.line.is_valid() || op.limit.is_negative() || *issuer_id == source.account_id {
        return Ok(fail(ChangeTrustResultCode::Malformed));
    }

    let Some(issuer) = ctx.account(issuer_id).await? else {
        return Ok(fail(ChangeTrustResultCode::NoIssuer));
    };

    match ctx.trustline(&source.account_id, &op.line).await? {
        Some(line) if op.limit == Amount::ZERO => {
            if line.balance != Amount::ZERO || line.liabilities.buying != Amount::ZERO {
                return Ok(fail(ChangeTrustResultCode::InvalidLimit));
            }
            let mut account = source.clone();
            account.num_sub_entries = account.num_sub_entries.saturating_sub(1);
            Ok(success(vec![
                Effect::DeleteTrustLine(line.account_id, line.asset),
                Effect::PutAccount(account),
            ]))
        }
        Some(mut line) => {
            if op.limit < line.balance.saturating_add(line.liabilities.buying) {
                return Ok(fail(ChangeTrustResultCode::InvalidLimit));
            }
            line.limit = op.limit;
            Ok(success(vec![Effect::PutTrustLine(line)]))
        }
        None if op.limit == Amount::ZERO => Ok(fail(ChangeTrustResultCode::InvalidLimit)),
        None => {
            if !source.can_add_sub_entry(ctx.base_reserve()) {
                return Ok(fail(ChangeTrustResultCode::LowReserve));
            }
            let line = TrustLineEntry {
                account_id: source.account_id.clone(),
                asset: op.line.clone(),
                balance: Amount::ZERO,
                limit: op.limit,
                authorized: !issuer.has_flag(AUTH_REQUIRED_FLAG),
                liabilities: Liabilities::default(),
            };
            let mut account = source.clone();
            account.num_sub_entries += 1;
            Ok(success(vec![Effect::PutTrustLine(line), Effect::PutAccount(account)]))
        }
    }
}

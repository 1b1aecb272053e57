use super::OperationOutcome;
use crate::error::ValidationError;
use crate::restrictions::Delta;
use crate::results::{AccountMergeResultCode, OperationInnerResult, OperationResult};
use crate::state::Effect;
use crate::transaction::AccountMergeOp;
use crate::types::{AccountEntry, AUTH_IMMUTABLE_FLAG};
use crate::validation::context::OperationContext;

fn fail(code: AccountMergeResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::AccountMerge(code))
}

pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &AccountMergeOp,
) -> Result<OperationOutcome, ValidationError> {
    if op.destination == source.account_id {
        return Ok(fail(AccountMergeResultCode::Malformed));
    }

    let Some(destination) = ctx.account(&op.destination).await? else {
        return Ok(fail(AccountMergeResultCode::NoAccount));
    };

    if source.has_flag(AUTH_IMMUTABLE_FLAG) {
        return Ok(fail(AccountMergeResultCode::ImmutableSet));
    }

    // Signers go away with the account; trustlines, offers and data do not
    if source.num_sub_entries as usize > source.signers.len() {
        return Ok(fail(AccountMergeResultCode::HasSubEntries));
    }

    // The sequence number must not collide with accounts created later
    if source.seq_num >= ctx.header().starting_sequence() {
        return Ok(fail(AccountMergeResultCode::SeqnumTooFar));
    }

    let Some(merged_balance) = destination.balance.checked_add(source.balance) else {
        return Ok(fail(AccountMergeResultCode::DestFull));
    };
    if destination.available_to_receive() < source.balance {
        return Ok(fail(AccountMergeResultCode::DestFull));
    }

    let delta = Delta::income(source.balance, Some(merged_balance));
    if let Some(threshold) = ctx.restriction(&destination, delta).await? {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    let mut merged = destination;
    merged.balance = merged_balance;

    Ok(OperationOutcome::success(
        OperationInnerResult::AccountMerge(AccountMergeResultCode::Success),
        vec![
            Effect::DeleteAccount(source.account_id.clone()),
            Effect::Outcome(source.account_id.clone(), source.balance),
            Effect::Income(merged.account_id.clone(), source.balance),
            Effect::PutAccount(merged),
        ],
    ))
}

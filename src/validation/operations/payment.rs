use super::{debit, issuer_exists, Holding, OperationOutcome};
use crate::error::ValidationError;
use crate::restrictions::Delta;
use crate::results::{OperationInnerResult, OperationResult, PaymentResultCode};
use crate::state::Effect;
use crate::transaction::PaymentOp;
use crate::types::AccountEntry;
use crate::validation::context::OperationContext;
use tracing::debug;

fn fail(code: PaymentResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::Payment(code))
}

pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &PaymentOp,
) -> Result<OperationOutcome, ValidationError> {
    if !op.amount.is_positive() || !op.asset.is_valid() {
        return Ok(fail(PaymentResultCode::Malformed));
    }

    let Some(destination) = ctx.account(&op.destination).await? else {
        return Ok(fail(PaymentResultCode::NoDestination));
    };

    if !issuer_exists(ctx, &op.asset).await? {
        return Ok(fail(PaymentResultCode::NoIssuer));
    }

    if destination.account_id == source.account_id {
        debug!("Self payment from {}", source.account_id);
        return Ok(OperationOutcome::success(
            OperationInnerResult::Payment(PaymentResultCode::Success),
            Vec::new(),
        ));
    }

    let Some(sending) = Holding::load(ctx, source, &op.asset).await? else {
        return Ok(fail(PaymentResultCode::SrcNoTrust));
    };
    if !sending.is_authorized() {
        return Ok(fail(PaymentResultCode::SrcNotAuthorized));
    }
    if sending.available_to_send(ctx.base_reserve()) < op.amount {
        return Ok(fail(PaymentResultCode::Underfunded));
    }

    let Some(receiving) = Holding::load(ctx, &destination, &op.asset).await? else {
        return Ok(fail(PaymentResultCode::NoTrust));
    };
    if !receiving.is_authorized() {
        return Ok(fail(PaymentResultCode::NotAuthorized));
    }
    if receiving.available_to_receive() < op.amount {
        return Ok(fail(PaymentResultCode::LineFull));
    }

    if let Some(threshold) = ctx.restriction(source, Delta::outcome(op.amount)).await? {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    let resulting = receiving
        .balance()
        .map(|balance| balance.saturating_add(op.amount));
    if let Some(threshold) = ctx
        .restriction(&destination, Delta::income(op.amount, resulting))
        .await?
    {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    let mut effects: Vec<Effect> = [sending.adjust(debit(op.amount)), receiving.adjust(op.amount)]
        .into_iter()
        .flatten()
        .collect();
    effects.push(Effect::Outcome(source.account_id.clone(), op.amount));
    effects.push(Effect::Income(destination.account_id.clone(), op.amount));

    Ok(OperationOutcome::success(
        OperationInnerResult::Payment(PaymentResultCode::Success),
        effects,
    ))
}

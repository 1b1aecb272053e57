use super::{debit, issuer_exists, Holding, OperationOutcome};
use crate::error::ValidationError;
use crate::restrictions::Delta;
use crate::results::{OperationInnerResult, OperationResult, PathPaymentResultCode};
use crate::state::Effect;
use crate::transaction::PathPaymentOp;
use crate::types::AccountEntry;
use crate::validation::context::OperationContext;

fn fail(code: PathPaymentResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::PathPayment(code))
}

/// Path payments are checked without the order book. A payment that stays
/// in one asset is checked exactly like a payment of `dest_amount`; one that
/// converts can only be caught when the source has nothing to spend, and is
/// counted at `send_max` against the source's limits.
pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &PathPaymentOp,
) -> Result<OperationOutcome, ValidationError> {
    let assets_valid = op.send_asset.is_valid()
        && op.dest_asset.is_valid()
        && op.path.iter().all(|asset| asset.is_valid());
    if !op.send_max.is_positive() || !op.dest_amount.is_positive() || !assets_valid {
        return Ok(fail(PathPaymentResultCode::Malformed));
    }

    let Some(destination) = ctx.account(&op.destination).await? else {
        return Ok(fail(PathPaymentResultCode::NoDestination));
    };

    if !issuer_exists(ctx, &op.dest_asset).await? || !issuer_exists(ctx, &op.send_asset).await? {
        return Ok(fail(PathPaymentResultCode::NoIssuer));
    }

    let direct = op.send_asset == op.dest_asset && op.path.is_empty();
    if direct && destination.account_id == source.account_id {
        return Ok(OperationOutcome::success(
            OperationInnerResult::PathPayment(PathPaymentResultCode::Success),
            Vec::new(),
        ));
    }

    let Some(receiving) = Holding::load(ctx, &destination, &op.dest_asset).await? else {
        return Ok(fail(PathPaymentResultCode::NoTrust));
    };
    if !receiving.is_authorized() {
        return Ok(fail(PathPaymentResultCode::NotAuthorized));
    }
    if receiving.available_to_receive() < op.dest_amount {
        return Ok(fail(PathPaymentResultCode::LineFull));
    }

    let Some(sending) = Holding::load(ctx, source, &op.send_asset).await? else {
        return Ok(fail(PathPaymentResultCode::SrcNoTrust));
    };
    if !sending.is_authorized() {
        return Ok(fail(PathPaymentResultCode::SrcNotAuthorized));
    }

    let available = sending.available_to_send(ctx.base_reserve());
    let sent = if direct {
        if op.dest_amount > op.send_max {
            return Ok(fail(PathPaymentResultCode::OverSendmax));
        }
        if available < op.dest_amount {
            return Ok(fail(PathPaymentResultCode::Underfunded));
        }
        op.dest_amount
    } else {
        if !available.is_positive() {
            return Ok(fail(PathPaymentResultCode::Underfunded));
        }
        op.send_max
    };

    if let Some(threshold) = ctx.restriction(source, Delta::outcome(sent)).await? {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    let resulting = receiving
        .balance()
        .map(|balance| balance.saturating_add(op.dest_amount));
    if let Some(threshold) = ctx
        .restriction(&destination, Delta::income(op.dest_amount, resulting))
        .await?
    {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    // Converting payments debit the worst case the source can cover
    let debited = sent.min(available);
    let mut effects = Vec::new();
    // A self payment within one asset touches a single balance
    if op.send_asset != op.dest_asset || source.account_id != destination.account_id {
        effects.extend(sending.adjust(debit(debited)));
        effects.extend(receiving.adjust(op.dest_amount));
    }
    effects.push(Effect::Outcome(source.account_id.clone(), sent));
    effects.push(Effect::Income(destination.account_id.clone(), op.dest_amount));

    Ok(OperationOutcome::success(
        OperationInnerResult::PathPayment(PathPaymentResultCode::Success),
        effects,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrictions::{Limit, Threshold};
    use crate::transaction::{Operation, OperationBody};
    use crate::types::Asset;
    use crate::validation::operations::fixtures::*;

    fn path_pay(send: Asset, send_max: i64, dest: Asset, dest_amount: i64) -> Operation {
        Operation::new(OperationBody::PathPayment(PathPaymentOp {
            send_asset: send,
            send_max: whole(send_max),
            destination: id("GB"),
            dest_asset: dest,
            dest_amount: whole(dest_amount),
            path: Vec::new(),
        }))
    }

    fn inner(code: PathPaymentResultCode) -> OperationResult {
        OperationInnerResult::PathPayment(code).into()
    }

    async fn harness() -> Harness {
        let harness = Harness::with_accounts(vec![
            account("GA", 1000),
            account("GB", 1000),
            account("GISSUER", 1000),
        ])
        .await;
        harness.ledger.put_trustline(line("GB", usd(), 0, 100)).await;
        harness
    }

    #[tokio::test]
    async fn test_direct_path_payment() {
        let harness = harness().await;
        let outcome = harness.run(path_pay(Asset::Native, 100, Asset::Native, 90)).await;
        assert_eq!(outcome.result, inner(PathPaymentResultCode::Success));
        assert!(outcome.effects.contains(&Effect::Outcome(id("GA"), whole(90))));

        let over = harness.run(path_pay(Asset::Native, 50, Asset::Native, 90)).await;
        assert_eq!(over.result, inner(PathPaymentResultCode::OverSendmax));

        let broke = harness.run(path_pay(Asset::Native, 990, Asset::Native, 990)).await;
        assert_eq!(broke.result, inner(PathPaymentResultCode::Underfunded));
    }

    #[tokio::test]
    async fn test_converting_path_payment() {
        let harness = harness().await;
        let outcome = harness.run(path_pay(Asset::Native, 200, usd(), 50)).await;
        assert!(outcome.result.is_success());
        assert!(outcome.effects.contains(&Effect::Outcome(id("GA"), whole(200))));

        let full = harness.run(path_pay(Asset::Native, 200, usd(), 101)).await;
        assert_eq!(full.result, inner(PathPaymentResultCode::LineFull));
    }

    #[tokio::test]
    async fn test_structural_checks() {
        let harness = harness().await;
        let cases = [
            (path_pay(Asset::Native, 0, usd(), 1), PathPaymentResultCode::Malformed),
            (path_pay(Asset::Native, 1, usd(), 0), PathPaymentResultCode::Malformed),
            (path_pay(Asset::Native, 1, Asset::credit("EUR", id("GISSUER")), 1), PathPaymentResultCode::NoTrust),
            (path_pay(Asset::credit("EUR", id("GISSUER")), 1, usd(), 1), PathPaymentResultCode::SrcNoTrust),
            (path_pay(Asset::Native, 1, Asset::credit("USD", id("GGONE")), 1), PathPaymentResultCode::NoIssuer),
        ];
        for (op, expected) in cases {
            assert_eq!(harness.run(op).await.result, inner(expected));
        }
    }

    #[tokio::test]
    async fn test_converting_payment_counts_send_max() {
        let mut harness = harness().await;
        harness.policy.max_daily_outcome = Limit::Max(whole(100));
        let outcome = harness.run(path_pay(Asset::Native, 101, usd(), 10)).await;
        assert_eq!(outcome.result, OperationResult::Restricted(Threshold::DailyOutcome));
    }
}

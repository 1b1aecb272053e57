use super::{debit, OperationOutcome};
use crate::error::ValidationError;
use crate::restrictions::{AccountClass, Delta};
use crate::results::{CreateAccountResultCode, OperationInnerResult, OperationResult};
use crate::state::Effect;
use crate::transaction::CreateAccountOp;
use crate::types::AccountEntry;
use crate::validation::context::OperationContext;

fn fail(code: CreateAccountResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::CreateAccount(code))
}

pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &CreateAccountOp,
) -> Result<OperationOutcome, ValidationError> {
    if !op.starting_balance.is_positive() {
        return Ok(fail(CreateAccountResultCode::Malformed));
    }

    if ctx.account(&op.destination).await?.is_some() {
        return Ok(fail(CreateAccountResultCode::AlreadyExist));
    }

    let reserve = ctx.base_reserve();
    let minimum = reserve.saturating_add(reserve);
    if op.starting_balance < minimum {
        return Ok(fail(CreateAccountResultCode::LowReserve));
    }

    if source.available_to_send(reserve) < op.starting_balance {
        return Ok(fail(CreateAccountResultCode::Underfunded));
    }

    if let Some(threshold) = ctx
        .restriction(source, Delta::outcome(op.starting_balance))
        .await?
    {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    // New accounts always start out anonymous
    let income = Delta::income(op.starting_balance, Some(op.starting_balance));
    if let Some(threshold) = ctx
        .restriction_for(&op.destination, AccountClass::Anonymous, income)
        .await?
    {
        return Ok(OperationOutcome::failed(OperationResult::Restricted(threshold)));
    }

    let mut funded = source.clone();
    funded.balance = funded.balance.saturating_add(debit(op.starting_balance));
    let created = AccountEntry::new(
        op.destination.clone(),
        op.starting_balance,
        ctx.header().starting_sequence(),
    );

    Ok(OperationOutcome::success(
        OperationInnerResult::CreateAccount(CreateAccountResultCode::Success),
        vec![
            Effect::PutAccount(funded),
            Effect::PutAccount(created),
            Effect::Outcome(source.account_id.clone(), op.starting_balance),
            Effect::Income(op.destination.clone(), op.starting_balance),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrictions::{Limit, Threshold};
    use crate::transaction::{Operation, OperationBody};
    use crate::validation::operations::fixtures::*;

    fn create(destination: &str, amount: i64) -> Operation {
        Operation::new(OperationBody::CreateAccount(CreateAccountOp {
            destination: id(destination),
            starting_balance: whole(amount),
        }))
    }

    fn code(outcome: &OperationOutcome) -> OperationResult {
        outcome.result
    }

    fn inner(code: CreateAccountResultCode) -> OperationResult {
        OperationInnerResult::CreateAccount(code).into()
    }

    #[tokio::test]
    async fn test_creates_account() {
        let harness = Harness::with_accounts(vec![account("GA", 1000)]).await;
        let outcome = harness.run(create("GNEW", 100)).await;
        assert_eq!(code(&outcome), inner(CreateAccountResultCode::Success));

        let created = outcome
            .effects
            .iter()
            .find_map(|effect| match effect {
                Effect::PutAccount(entry) if entry.account_id == id("GNEW") => Some(entry.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(created.balance, whole(100));
        assert_eq!(created.seq_num, header().starting_sequence());
        assert!(created.is_anonymous());
    }

    #[tokio::test]
    async fn test_rejections() {
        let harness = Harness::with_accounts(vec![account("GA", 1000), account("GB", 10)]).await;

        let cases = [
            (create("GNEW", 0), CreateAccountResultCode::Malformed),
            (create("GB", 100), CreateAccountResultCode::AlreadyExist),
            (create("GNEW", 19), CreateAccountResultCode::LowReserve),
            (create("GNEW", 990), CreateAccountResultCode::Underfunded),
        ];
        for (op, expected) in cases {
            assert_eq!(code(&harness.run(op).await), inner(expected));
        }
    }

    #[tokio::test]
    async fn test_new_account_balance_is_restricted() {
        let mut harness = Harness::with_accounts(vec![account("GA", 100_000)]).await;
        harness.policy.max_balance = Limit::Max(whole(14000));

        let outcome = harness.run(create("GNEW", 15000)).await;
        assert_eq!(outcome.result, OperationResult::Restricted(Threshold::Balance));

        let outcome = harness.run(create("GNEW", 14000)).await;
        assert!(outcome.result.is_success());
    }
}

use super::OperationOutcome;
use crate::error::ValidationError;
use crate::results::{OperationInnerResult, SetOptionsResultCode};
use crate::state::Effect;
use crate::transaction::SetOptionsOp;
use crate::types::{AccountEntry, AUTH_IMMUTABLE_FLAG, MASK_ACCOUNT_FLAGS, MAX_SIGNERS};
use crate::validation::context::OperationContext;

/// Longest home domain in bytes.
const MAX_HOME_DOMAIN: usize = 32;

fn fail(code: SetOptionsResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::SetOptions(code))
}

fn valid_home_domain(domain: &str) -> bool {
    domain.len() <= MAX_HOME_DOMAIN && domain.chars().all(|c| c.is_ascii() && !c.is_ascii_control())
}

pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &SetOptionsOp,
) -> Result<OperationOutcome, ValidationError> {
    let set = op.set_flags.unwrap_or(0);
    let clear = op.clear_flags.unwrap_or(0);
    if (set | clear) & !MASK_ACCOUNT_FLAGS != 0 {
        return Ok(fail(SetOptionsResultCode::UnknownFlag));
    }
    if set & clear != 0 {
        return Ok(fail(SetOptionsResultCode::BadFlags));
    }

    let weights = [op.master_weight, op.low_threshold, op.med_threshold, op.high_threshold];
    let signer_weight = op.signer.as_ref().map(|signer| signer.weight);
    if weights.iter().chain([&signer_weight]).flatten().any(|w| *w > u8::MAX as u32) {
        return Ok(fail(SetOptionsResultCode::ThresholdOutOfRange));
    }

    if let Some(signer) = &op.signer {
        if signer.key == source.account_id {
            return Ok(fail(SetOptionsResultCode::BadSigner));
        }
    }

    if let Some(domain) = &op.home_domain {
        if !valid_home_domain(domain) {
            return Ok(fail(SetOptionsResultCode::InvalidHomeDomain));
        }
    }

    let mut account = source.clone();

    if let Some(destination) = &op.inflation_dest {
        if ctx.account(destination).await?.is_none() {
            return Ok(fail(SetOptionsResultCode::InvalidInflation));
        }
        account.inflation_dest = Some(destination.clone());
    }

    if set | clear != 0 {
        if source.has_flag(AUTH_IMMUTABLE_FLAG) {
            return Ok(fail(SetOptionsResultCode::CantChange));
        }
        account.flags = (account.flags & !clear) | set;
    }

    for (slot, weight) in weights.into_iter().enumerate() {
        if let Some(weight) = weight {
            account.thresholds[slot] = weight as u8;
        }
    }

    if let Some(domain) = &op.home_domain {
        account.home_domain = domain.clone();
    }

    if let Some(signer) = &op.signer {
        let existing = account.signers.iter().position(|s| s.key == signer.key);
        match (existing, signer.weight) {
            (Some(index), 0) => {
                account.signers.remove(index);
                account.num_sub_entries = account.num_sub_entries.saturating_sub(1);
            }
            (Some(index), weight) => account.signers[index].weight = weight,
            // Removing a signer that is not there changes nothing
            (None, 0) => {}
            (None, _) => {
                if account.signers.len() >= MAX_SIGNERS {
                    return Ok(fail(SetOptionsResultCode::TooManySigners));
                }
                if !account.can_add_sub_entry(ctx.base_reserve()) {
                    return Ok(fail(SetOptionsResultCode::LowReserve));
                }
                account.signers.push(signer.clone());
                account.num_sub_entries += 1;
            }
        }
    }

    Ok(OperationOutcome::success(
        OperationInnerResult::SetOptions(SetOptionsResultCode::Success),
        vec![Effect::PutAccount(account)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::OperationResult;
    use crate::transaction::{Operation, OperationBody};
    use crate::types::{Signer, AUTH_REQUIRED_FLAG, AUTH_REVOCABLE_FLAG};
    use crate::validation::operations::fixtures::*;

    fn set_options(op: SetOptionsOp) -> Operation {
        Operation::new(OperationBody::SetOptions(op))
    }

    fn inner(code: SetOptionsResultCode) -> OperationResult {
        OperationInnerResult::SetOptions(code).into()
    }

    fn updated(outcome: &OperationOutcome) -> AccountEntry {
        match &outcome.effects[..] {
            [Effect::PutAccount(entry)] => entry.clone(),
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_structural_rejections() {
        let harness = Harness::with_accounts(vec![account("GA", 1000)]).await;
        let cases = [
            (SetOptionsOp { set_flags: Some(8), ..Default::default() }, SetOptionsResultCode::UnknownFlag),
            (
                SetOptionsOp { set_flags: Some(1), clear_flags: Some(1), ..Default::default() },
                SetOptionsResultCode::BadFlags,
            ),
            (SetOptionsOp { master_weight: Some(256), ..Default::default() }, SetOptionsResultCode::ThresholdOutOfRange),
            (
                SetOptionsOp {
                    signer: Some(Signer { key: id("GA"), weight: 1 }),
                    ..Default::default()
                },
                SetOptionsResultCode::BadSigner,
            ),
            (
                SetOptionsOp { home_domain: Some("x".repeat(33)), ..Default::default() },
                SetOptionsResultCode::InvalidHomeDomain,
            ),
            (
                SetOptionsOp { home_domain: Some("bad\ndomain".to_string()), ..Default::default() },
                SetOptionsResultCode::InvalidHomeDomain,
            ),
            (
                SetOptionsOp { inflation_dest: Some(id("GNOPE")), ..Default::default() },
                SetOptionsResultCode::InvalidInflation,
            ),
        ];
        for (op, expected) in cases {
            assert_eq!(harness.run(set_options(op)).await.result, inner(expected));
        }
    }

    #[tokio::test]
    async fn test_flags_and_thresholds() {
        let harness = Harness::with_accounts(vec![account("GA", 1000)]).await;
        let op = SetOptionsOp {
            set_flags: Some(AUTH_REQUIRED_FLAG | AUTH_REVOCABLE_FLAG),
            master_weight: Some(10),
            high_threshold: Some(5),
            home_domain: Some("example.com".to_string()),
            ..Default::default()
        };
        let outcome = harness.run(set_options(op)).await;
        assert!(outcome.result.is_success());

        let account = updated(&outcome);
        assert_eq!(account.flags, AUTH_REQUIRED_FLAG | AUTH_REVOCABLE_FLAG);
        assert_eq!(account.thresholds, [10, 0, 0, 5]);
        assert_eq!(account.home_domain, "example.com");
    }

    #[tokio::test]
    async fn test_immutable_account_cannot_change_flags() {
        let mut source = account("GA", 1000);
        source.flags = AUTH_IMMUTABLE_FLAG;
        let harness = Harness::with_accounts(vec![source]).await;
        let op = SetOptionsOp { clear_flags: Some(AUTH_IMMUTABLE_FLAG), ..Default::default() };
        assert_eq!(harness.run(set_options(op)).await.result, inner(SetOptionsResultCode::CantChange));
    }

    #[tokio::test]
    async fn test_signer_lifecycle() {
        let harness = Harness::with_accounts(vec![account("GA", 1000)]).await;
        let add = SetOptionsOp {
            signer: Some(Signer { key: id("GSIGNER"), weight: 3 }),
            ..Default::default()
        };
        let account = updated(&harness.run(set_options(add)).await);
        assert_eq!(account.signers.len(), 1);
        assert_eq!(account.num_sub_entries, 1);

        harness.ledger.put_account(account).await;
        let remove = SetOptionsOp {
            signer: Some(Signer { key: id("GSIGNER"), weight: 0 }),
            ..Default::default()
        };
        let account = updated(&harness.run(set_options(remove)).await);
        assert!(account.signers.is_empty());
        assert_eq!(account.num_sub_entries, 0);
    }

    #[tokio::test]
    async fn test_signer_limits() {
        let mut crowded = account("GA", 100_000);
        crowded.signers = (0..MAX_SIGNERS)
            .map(|n| Signer { key: id(&format!("GS{}", n)), weight: 1 })
            .collect();
        crowded.num_sub_entries = MAX_SIGNERS as u32;
        let harness = Harness::with_accounts(vec![crowded]).await;
        let add = SetOptionsOp {
            signer: Some(Signer { key: id("GNEW"), weight: 1 }),
            ..Default::default()
        };
        assert_eq!(harness.run(set_options(add.clone())).await.result, inner(SetOptionsResultCode::TooManySigners));

        let poor = Harness::with_accounts(vec![account("GA", 25)]).await;
        assert_eq!(poor.run(set_options(add)).await.result, inner(SetOptionsResultCode::LowReserve));
    }
}

use super::OperationOutcome;
use crate::error::ValidationError;
use crate::results::{AllowTrustResultCode, OperationInnerResult};
use crate::state::Effect;
use crate::transaction::AllowTrustOp;
use crate::types::{AccountEntry, Asset, AUTH_REQUIRED_FLAG, AUTH_REVOCABLE_FLAG};
use crate::validation::context::OperationContext;

fn fail(code: AllowTrustResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::AllowTrust(code))
}

/// The source is the issuer; it (de)authorizes the trustor's line for one
/// of its own asset codes.
pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &AllowTrustOp,
) -> Result<OperationOutcome, ValidationError> {
    if op.trustor == source.account_id {
        return Ok(fail(AllowTrustResultCode::SelfNotAllowed));
    }

    let asset = Asset::credit(op.asset_code.clone(), source.account_id.clone());
    if !asset.is_valid() {
        return Ok(fail(AllowTrustResultCode::Malformed));
    }

    if !source.has_flag(AUTH_REQUIRED_FLAG) {
        return Ok(fail(AllowTrustResultCode::TrustNotRequired));
    }
    if !op.authorize && !source.has_flag(AUTH_REVOCABLE_FLAG) {
        return Ok(fail(AllowTrustResultCode::CantRevoke));
    }

    let Some(mut line) = ctx.trustline(&op.trustor, &asset).await? else {
        return Ok(fail(AllowTrustResultCode::NoTrustLine));
    };
    line.authorized = op.authorize;

    Ok(OperationOutcome::success(
        OperationInnerResult::AllowTrust(AllowTrustResultCode::Success),
        vec![Effect::PutTrustLine(line)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::OperationResult;
    use crate::transaction::{Operation, OperationBody};
    use crate::validation::operations::fixtures::*;

    fn allow(trustor: &str, code: &str, authorize: bool) -> Operation {
        Operation::new(OperationBody::AllowTrust(AllowTrustOp {
            trustor: id(trustor),
            asset_code: code.to_string(),
            authorize,
        }))
        .with_source(id("GISSUER"))
    }

    fn inner(code: AllowTrustResultCode) -> OperationResult {
        OperationInnerResult::AllowTrust(code).into()
    }

    async fn harness(issuer_flags: u32) -> Harness {
        let mut issuer = account("GISSUER", 1000);
        issuer.flags = issuer_flags;
        let harness = Harness::with_accounts(vec![account("GA", 1000), issuer]).await;
        let mut pending = line("GA", usd(), 0, 100);
        pending.authorized = false;
        harness.ledger.put_trustline(pending).await;
        harness
    }

    #[tokio::test]
    async fn test_authorizes_line() {
        let harness = harness(AUTH_REQUIRED_FLAG).await;
        let outcome = harness.run(allow("GA", "USD", true)).await;
        assert!(outcome.result.is_success());
        assert!(matches!(&outcome.effects[0], Effect::PutTrustLine(entry) if entry.authorized));
    }

    #[tokio::test]
    async fn test_rejections() {
        let harness = harness(AUTH_REQUIRED_FLAG).await;
        harness.ledger.put_account(account("GB", 1000)).await;
        let cases = [
            (allow("GISSUER", "USD", true), AllowTrustResultCode::SelfNotAllowed),
            (allow("GA", "", true), AllowTrustResultCode::Malformed),
            (allow("GA", "TOOLONGASSETCODE", true), AllowTrustResultCode::Malformed),
            (allow("GA", "USD", false), AllowTrustResultCode::CantRevoke),
            (allow("GB", "USD", true), AllowTrustResultCode::NoTrustLine),
        ];
        for (op, expected) in cases {
            assert_eq!(harness.run(op).await.result, inner(expected));
        }

        let open = self::harness(0).await;
        assert_eq!(open.run(allow("GA", "USD", true)).await.result, inner(AllowTrustResultCode::TrustNotRequired));
    }

    #[tokio::test]
    async fn test_revocable_issuer_can_revoke() {
        let harness = harness(AUTH_REQUIRED_FLAG | AUTH_REVOCABLE_FLAG).await;
        let outcome = harness.run(allow("GA", "USD", false)).await;
        assert!(outcome.result.is_success());
    }
}

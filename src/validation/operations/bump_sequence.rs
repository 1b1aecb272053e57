use super::OperationOutcome;
use crate::results::{BumpSequenceResultCode, OperationInnerResult};
use crate::state::Effect;
use crate::transaction::BumpSequenceOp;
use crate::types::AccountEntry;

/// Sequence numbers only move forward; bumping to a lower or equal value
/// succeeds and leaves the account alone.
pub(super) fn validate(source: &AccountEntry, op: &BumpSequenceOp) -> OperationOutcome {
    if op.bump_to < 0 {
        return OperationOutcome::failed(OperationInnerResult::BumpSequence(BumpSequenceResultCode::BadSeq));
    }

    let mut effects = Vec::new();
    if op.bump_to > source.seq_num {
        let mut account = source.clone();
        account.seq_num = op.bump_to;
        effects.push(Effect::PutAccount(account));
    }

    OperationOutcome::success(
        OperationInnerResult::BumpSequence(BumpSequenceResultCode::Success),
        effects,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::operations::fixtures::*;

    #[test]
    fn test_bump() {
        let source = account("GA", 100);
        let forward = validate(&source, &BumpSequenceOp { bump_to: 50 });
        assert!(forward.result.is_success());
        assert!(matches!(&forward.effects[..], [Effect::PutAccount(entry)] if entry.seq_num == 50));

        let backward = validate(&source, &BumpSequenceOp { bump_to: 0 });
        assert!(backward.result.is_success());
        assert!(backward.effects.is_empty());

        let negative = validate(&source, &BumpSequenceOp { bump_to: -1 });
        assert!(!negative.result.is_success());
    }
}

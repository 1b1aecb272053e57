use super::OperationOutcome;
use crate::error::ValidationError;
use crate::results::{ManageDataResultCode, OperationInnerResult};
use crate::state::Effect;
use crate::transaction::{ManageDataOp, MAX_DATA_LENGTH};
use crate::types::{AccountEntry, DataEntry};
use crate::validation::context::OperationContext;

fn fail(code: ManageDataResultCode) -> OperationOutcome {
    OperationOutcome::failed(OperationInnerResult::ManageData(code))
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_DATA_LENGTH && !name.chars().any(char::is_control)
}

pub(super) async fn validate(
    ctx: &OperationContext<'_>,
    source: &AccountEntry,
    op: &ManageDataOp,
) -> Result<OperationOutcome, ValidationError> {
    if !valid_name(&op.name) {
        return Ok(fail(ManageDataResultCode::InvalidName));
    }

    let existing = ctx.state().data(&source.account_id, &op.name).await?;
    let mut account = source.clone();

    let effects = match (&op.value, existing) {
        (None, None) => return Ok(fail(ManageDataResultCode::NameNotFound)),
        (None, Some(_)) => {
            account.num_sub_entries = account.num_sub_entries.saturating_sub(1);
            vec![
                Effect::DeleteData(source.account_id.clone(), op.name.clone()),
                Effect::PutAccount(account),
            ]
        }
        (Some(value), Some(mut entry)) => {
            entry.value = value.clone();
            vec![Effect::PutData(entry)]
        }
        (Some(value), None) => {
            if !source.can_add_sub_entry(ctx.base_reserve()) {
                return Ok(fail(ManageDataResultCode::LowReserve));
            }
            account.num_sub_entries += 1;
            vec![
                Effect::PutData(DataEntry {
                    account_id: source.account_id.clone(),
                    name: op.name.clone(),
                    value: value.clone(),
                }),
                Effect::PutAccount(account),
            ]
        }
    };

    Ok(OperationOutcome::success(
        OperationInnerResult::ManageData(ManageDataResultCode::Success),
        effects,
    ))
}

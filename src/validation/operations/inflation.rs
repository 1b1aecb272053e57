use super::OperationOutcome;
use crate::results::{InflationResultCode, OperationInnerResult};
use crate::validation::context::OperationContext;

/// Close time of the first inflation round, unix seconds.
pub const INFLATION_START_TIME: i64 = 1_404_172_800;
/// One week.
pub const INFLATION_FREQUENCY: i64 = 7 * 24 * 60 * 60;

/// Earliest close time at which the next inflation round may run.
pub fn next_inflation_time(inflation_seq: u32) -> i64 {
    INFLATION_START_TIME.saturating_add((inflation_seq as i64).saturating_mul(INFLATION_FREQUENCY))
}

pub(super) fn validate(ctx: &OperationContext<'_>) -> OperationOutcome {
    let header = ctx.header();
    if header.close_time < next_inflation_time(header.inflation_seq) {
        return OperationOutcome::failed(OperationInnerResult::Inflation(InflationResultCode::NotTime));
    }
    OperationOutcome::success(
        OperationInnerResult::Inflation(InflationResultCode::Success),
        Vec::new(),
    )
}

use super::codes::*;
use crate::restrictions::Threshold;
use serde::{Deserialize, Serialize};

/// Operation-specific result, tagged by operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "code", rename_all = "snake_case")]
pub enum OperationInnerResult {
    CreateAccount(CreateAccountResultCode),
    Payment(PaymentResultCode),
    PathPayment(PathPaymentResultCode),
    ManageOffer(ManageOfferResultCode),
    CreatePassiveOffer(ManageOfferResultCode),
    SetOptions(SetOptionsResultCode),
    ChangeTrust(ChangeTrustResultCode),
    AllowTrust(AllowTrustResultCode),
    AccountMerge(AccountMergeResultCode),
    Inflation(InflationResultCode),
    ManageData(ManageDataResultCode),
    BumpSequence(BumpSequenceResultCode),
}

impl OperationInnerResult {
    pub fn code(self) -> i32 {
        match self {
            OperationInnerResult::CreateAccount(c) => c.code(),
            OperationInnerResult::Payment(c) => c.code(),
            OperationInnerResult::PathPayment(c) => c.code(),
            OperationInnerResult::ManageOffer(c) => c.code(),
            OperationInnerResult::CreatePassiveOffer(c) => c.code(),
            OperationInnerResult::SetOptions(c) => c.code(),
            OperationInnerResult::ChangeTrust(c) => c.code(),
            OperationInnerResult::AllowTrust(c) => c.code(),
            OperationInnerResult::AccountMerge(c) => c.code(),
            OperationInnerResult::Inflation(c) => c.code(),
            OperationInnerResult::ManageData(c) => c.code(),
            OperationInnerResult::BumpSequence(c) => c.code(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationInnerResult::CreateAccount(c) => c.as_str(),
            OperationInnerResult::Payment(c) => c.as_str(),
            OperationInnerResult::PathPayment(c) => c.as_str(),
            OperationInnerResult::ManageOffer(c) => c.as_str(),
            OperationInnerResult::CreatePassiveOffer(c) => c.as_str(),
            OperationInnerResult::SetOptions(c) => c.as_str(),
            OperationInnerResult::ChangeTrust(c) => c.as_str(),
            OperationInnerResult::AllowTrust(c) => c.as_str(),
            OperationInnerResult::AccountMerge(c) => c.as_str(),
            OperationInnerResult::Inflation(c) => c.as_str(),
            OperationInnerResult::ManageData(c) => c.as_str(),
            OperationInnerResult::BumpSequence(c) => c.as_str(),
        }
    }

    /// Every kind uses `0` for success.
    pub fn is_success(self) -> bool {
        self.code() == 0
    }
}

/// Result of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum OperationResult {
    /// The operation ran; the inner code says how it went.
    Inner(OperationInnerResult),
    /// The operation's own source account does not exist.
    NoAccount,
    /// A restriction threshold for anonymous accounts would be exceeded.
    Restricted(Threshold),
    /// Not evaluated because validation stopped earlier.
    NotAttempted,
}

impl OperationResult {
    pub fn is_success(self) -> bool {
        matches!(self, OperationResult::Inner(inner) if inner.is_success())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationResult::Inner(inner) => inner.as_str(),
            OperationResult::NoAccount => "op_no_source_account",
            OperationResult::Restricted(_) => "op_restricted",
            OperationResult::NotAttempted => "op_not_attempted",
        }
    }
}

impl From<OperationInnerResult> for OperationResult {
    fn from(inner: OperationInnerResult) -> Self {
        OperationResult::Inner(inner)
    }
}

/// Aggregated verdict for a whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Success,
    /// Transaction-level precondition failed; no operation was evaluated.
    Rejected { code: TransactionResultCode },
    /// The operation at `index` failed with `result`.
    OperationFailed { index: usize, result: OperationResult },
}

impl TransactionOutcome {
    /// Wire code: operation failures surface as `tx_failed`.
    pub fn code(self) -> TransactionResultCode {
        match self {
            TransactionOutcome::Success => TransactionResultCode::TxSuccess,
            TransactionOutcome::Rejected { code } => code,
            TransactionOutcome::OperationFailed { .. } => TransactionResultCode::TxFailed,
        }
    }
}

/// Output of validating one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub outcome: TransactionOutcome,
    /// One entry per operation, in transaction order.
    pub operations: Vec<OperationResult>,
}

impl ValidationResult {
    /// Transaction-level rejection: every operation is left unattempted.
    pub fn rejected(code: TransactionResultCode, operation_count: usize) -> Self {
        Self {
            outcome: TransactionOutcome::Rejected { code },
            operations: vec![OperationResult::NotAttempted; operation_count],
        }
    }

    /// Derives the outcome from per-operation results: the first
    /// non-success decides, otherwise the transaction succeeded.
    pub fn from_operations(operations: Vec<OperationResult>) -> Self {
        let outcome = operations
            .iter()
            .enumerate()
            .find(|(_, result)| !result.is_success())
            .map(|(index, result)| TransactionOutcome::OperationFailed {
                index,
                result: *result,
            })
            .unwrap_or(TransactionOutcome::Success);

        Self {
            outcome,
            operations,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == TransactionOutcome::Success
    }

    pub fn code(&self) -> TransactionResultCode {
        self.outcome.code()
    }

    /// The failing operation's result, if an operation failed.
    pub fn failed_operation(&self) -> Option<OperationResult> {
        match self.outcome {
            TransactionOutcome::OperationFailed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// String codes in the shape clients receive.
    pub fn result_codes(&self) -> ResultCodes {
        ResultCodes {
            transaction: self.code().as_str().to_string(),
            operations: self
                .operations
                .iter()
                .map(|result| result.as_str().to_string())
                .collect(),
            restriction: self.operations.iter().find_map(|result| match result {
                OperationResult::Restricted(threshold) => Some(*threshold),
                _ => None,
            }),
        }
    }
}

/// Client-facing summary of a [`ValidationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCodes {
    pub transaction: String,
    pub operations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction: Option<Threshold>,
}

use super::envelope::{Operation, OperationBody, TransactionEnvelope};
use crate::results::{OperationResult, ValidationResult};
use crate::types::AccountId;
use chrono::{DateTime, Utc};

/// A transaction being validated, with one frame per operation.
#[derive(Debug, Clone)]
pub struct TransactionFrame {
    envelope: TransactionEnvelope,
    submitted_at: DateTime<Utc>,
    operations: Vec<OperationFrame>,
    result: Option<ValidationResult>,
}

impl TransactionFrame {
    pub fn new(envelope: TransactionEnvelope, submitted_at: DateTime<Utc>) -> Self {
        let operations = envelope
            .operations
            .iter()
            .enumerate()
            .map(|(index, op)| OperationFrame::new(index, op, &envelope.source_account))
            .collect();

        Self {
            envelope,
            submitted_at,
            operations,
            result: None,
        }
    }

    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn source_account(&self) -> &AccountId {
        &self.envelope.source_account
    }

    pub fn seq_num(&self) -> i64 {
        self.envelope.seq_num
    }

    pub fn fee(&self) -> i64 {
        self.envelope.fee
    }

    /// Time the transaction is validated against (time bounds, windows).
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn operations(&self) -> &[OperationFrame] {
        &self.operations
    }

    pub(crate) fn operations_mut(&mut self) -> &mut [OperationFrame] {
        &mut self.operations
    }

    pub fn result(&self) -> Option<&ValidationResult> {
        self.result.as_ref()
    }

    /// Clears results left over from an earlier validation of this frame.
    pub(crate) fn reset(&mut self) {
        self.result = None;
        for op in &mut self.operations {
            op.result = None;
        }
    }

    pub(crate) fn record_result(&mut self, result: ValidationResult) {
        self.result = Some(result);
    }
}

/// One operation of a [`TransactionFrame`].
#[derive(Debug, Clone)]
pub struct OperationFrame {
    index: usize,
    source_account: AccountId,
    explicit_source: bool,
    body: OperationBody,
    result: Option<OperationResult>,
}

impl OperationFrame {
    fn new(index: usize, op: &Operation, tx_source: &AccountId) -> Self {
        Self {
            index,
            source_account: op
                .source_account
                .clone()
                .unwrap_or_else(|| tx_source.clone()),
            explicit_source: op.source_account.is_some(),
            body: op.body.clone(),
            result: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Operation source, falling back to the transaction source.
    pub fn source_account(&self) -> &AccountId {
        &self.source_account
    }

    /// Whether the operation named its own source account.
    pub fn has_explicit_source(&self) -> bool {
        self.explicit_source
    }

    pub fn body(&self) -> &OperationBody {
        &self.body
    }

    pub fn result(&self) -> Option<OperationResult> {
        self.result
    }

    /// Stores the result. Each frame is validated at most once per run.
    pub(crate) fn set_result(&mut self, result: OperationResult) {
        debug_assert!(
            self.result.is_none(),
            "operation {} result set twice",
            self.index
        );
        self.result = Some(result);
    }
}

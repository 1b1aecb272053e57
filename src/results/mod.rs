//! Result Encoding Module
//!
//! Closed result vocabulary for transactions and operations, mirroring the
//! consensus protocol's codes, plus the client-facing string view.

mod codes;
mod encoder;

pub use codes::*;
pub use encoder::{
    OperationInnerResult, OperationResult, ResultCodes, TransactionOutcome, ValidationResult,
};

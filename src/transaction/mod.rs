//! Transaction Module
//!
//! The structured transaction envelope produced by the upstream decode step,
//! and the frames the validation engine works on.

mod envelope;
mod frame;

pub use envelope::*;
pub use frame::{OperationFrame, TransactionFrame};

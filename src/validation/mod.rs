//! Transaction Validation Module
//!
//! Decides whether a submitted transaction would be accepted by the ledger
//! as it currently stands. Transaction-level checks run first, then every
//! operation in order against a per-transaction overlay, with anonymous
//! accounts additionally held to the restriction policy.

mod cancel;
mod context;
mod manager;
pub mod operations;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use context::OperationContext;
pub use manager::ValidationManager;
pub use operations::OperationOutcome;

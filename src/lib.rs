//! Pre-validation gateway for transaction submission.
//! It checks a submitted transaction against the current ledger state and the
//! restriction policy for anonymous accounts, and reports the result codes the
//! consensus node would produce, before the transaction is forwarded.

pub mod amount; // Fixed-point protocol amounts.
pub mod types; // Ledger entries and other common data structures.
pub mod transaction; // Transaction envelopes and the frames validated from them.
pub mod results; // Result codes and the client-facing view of them.
pub mod error; // Infrastructure errors.
pub mod state; // Ledger state access and the per-transaction overlay.
pub mod history; // Account history aggregates and their shared cache.
pub mod restrictions; // Limits on anonymous accounts.
pub mod validation; // Transaction and operation validation.
pub mod api; // JSON-RPC submission endpoint.
pub mod config; // Defines and loads gateway configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use amount::Amount;
pub use config::Config;
pub use error::{StoreError, ValidationError};
pub use validation::ValidationManager;

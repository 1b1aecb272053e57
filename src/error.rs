//! Error Module
//!
//! Infrastructure failures only. Anything a transaction does wrong is a
//! result code (see `results`), never one of these errors.

use thiserror::Error;

/// Failure of a backing store (ledger mirror or history database).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backend unreachable or the connection pool timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store query failed: {0}")]
    Query(String),
    /// A row could not be turned into a domain value.
    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Why a transaction could not be validated at all.
///
/// Callers treat these as "unknown, retry later"; the transaction itself may
/// be perfectly valid.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("validation cancelled")]
    Cancelled,
}

impl ValidationError {
    /// Whether a later attempt may succeed. Corrupt rows stay corrupt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ValidationError::Store(StoreError::Corrupt { .. }))
    }
}

//! API Module
//!
//! This module handles the JSON-RPC API for transaction submission.
//! It provides the HTTP endpoint that clients use to submit transactions.

mod server;
pub use server::{router, AppState, Server, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, RETRYABLE};

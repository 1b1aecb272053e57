//! Restriction Policy Module
//!
//! Business limits layered on top of protocol validation. Anonymous accounts
//! may only spend, receive and hold up to the configured thresholds; a
//! violation is reported as its own result code, never as a protocol failure.

mod policy;
pub use policy::{AccountClass, Delta, Limit, RestrictionPolicy, Threshold, Verdict};

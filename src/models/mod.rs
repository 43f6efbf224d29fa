//! Domain models for the claim risk pipeline
//!
//! This module contains the record types that flow between pipeline stages:
//! raw claim rows as read from a table, normalized one-diagnosis/one-procedure
//! claim records, and per-patient feature records.

pub mod claim;
pub mod features;

// Re-export commonly used types
pub use claim::{ClaimRecord, RawClaim};
pub use features::{ClaimFeatureRow, PatientFeatureRecord};

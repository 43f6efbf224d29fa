//! Claim entity models
//!
//! `RawClaim` mirrors one row of the input claim table, where the diagnosis
//! and procedure columns may hold several delimiter-separated codes.
//! `ClaimRecord` is the normalized form: exactly one diagnosis and at most one
//! procedure per record.

use serde::{Deserialize, Serialize};

/// One row of the input claim table, as read from CSV or Parquet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClaim {
    /// Member (patient) identifier
    #[serde(rename = "MemberID", default)]
    pub member_id: Option<String>,
    /// Claim identifier
    #[serde(rename = "ClaimID", default)]
    pub claim_id: Option<String>,
    /// Age in years
    #[serde(rename = "Age", default, deserialize_with = "csv::invalid_option")]
    pub age: Option<f64>,
    /// Free-text gender
    #[serde(rename = "Gender", default)]
    pub gender: Option<String>,
    /// One or more diagnosis codes
    #[serde(rename = "DiagnosisCode", default)]
    pub diagnosis_code: Option<String>,
    /// One or more procedure codes
    #[serde(rename = "ProcedureCode", default)]
    pub procedure_code: Option<String>,
    /// Billed amount
    #[serde(
        rename = "AmountBilled",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub amount_billed: Option<f64>,
}

impl RawClaim {
    /// Create a raw claim row with every column populated
    #[must_use]
    pub fn new(
        member_id: &str,
        claim_id: &str,
        age: f64,
        gender: &str,
        diagnosis_code: &str,
        procedure_code: &str,
        amount_billed: f64,
    ) -> Self {
        Self {
            member_id: Some(member_id.to_string()),
            claim_id: Some(claim_id.to_string()),
            age: Some(age),
            gender: Some(gender.to_string()),
            diagnosis_code: Some(diagnosis_code.to_string()),
            procedure_code: Some(procedure_code.to_string()),
            amount_billed: Some(amount_billed),
        }
    }
}

/// A normalized claim: one member, one diagnosis, at most one procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Member (patient) identifier
    #[serde(rename = "MemberID")]
    pub member_id: String,
    /// Claim identifier (row-scoped when the source row had none)
    #[serde(rename = "ClaimID")]
    pub claim_id: String,
    /// Age in years
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    /// Free-text gender
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    /// Single diagnosis code
    #[serde(rename = "DiagnosisCode")]
    pub diagnosis_code: String,
    /// Single procedure code
    #[serde(rename = "ProcedureCode")]
    pub procedure_code: Option<String>,
    /// Billed amount of the source claim
    #[serde(rename = "AmountBilled")]
    pub amount_billed: Option<f64>,
}

//! Patient feature models
//!
//! `PatientFeatureRecord` is the per-member aggregate produced by the feature
//! aggregator and scored by the rule-based scorer. `ClaimFeatureRow` joins one
//! claim back onto its member's aggregate and is the unit the classifier
//! trains on and predicts for.

use serde::{Deserialize, Serialize};

use crate::algorithm::health::scoring::RiskClass;
use crate::models::claim::ClaimRecord;

/// Aggregated disease-burden features for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatureRecord {
    /// Member (patient) identifier
    pub member_id: String,
    /// Age from the first claim row seen for the member
    pub age: Option<f64>,
    /// Gender from the first claim row seen for the member
    pub gender: Option<String>,
    /// Distinct claim lines with a catalogued diagnosis
    pub num_claims: u32,
    /// Distinct catalogued diseases
    pub unique_diseases: u32,
    /// Mean criticality over claim lines
    pub avg_criticality: f64,
    /// Highest criticality over claim lines
    pub max_criticality: u8,
    /// Distinct diseases with criticality of 4 or more
    pub chronic_count: u32,
    /// Deduplicated advice text joined with "; "
    pub preventive_care_advice: String,
    /// Distinct disease names in first-seen order
    pub diseases: Vec<String>,
    /// Rule-based risk class, set by the scorer
    pub risk_score: Option<RiskClass>,
}

impl PatientFeatureRecord {
    /// Attach a risk class to this record
    #[must_use]
    pub fn with_risk_score(mut self, risk_score: RiskClass) -> Self {
        self.risk_score = Some(risk_score);
        self
    }
}

/// One claim joined with its member's aggregated features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFeatureRow {
    /// Member (patient) identifier
    pub member_id: String,
    /// Claim identifier
    pub claim_id: String,
    /// Age on the claim
    pub age: Option<f64>,
    /// Gender on the claim
    pub gender: Option<String>,
    /// Member-level distinct claim lines
    pub num_claims: u32,
    /// Member-level distinct diseases
    pub unique_diseases: u32,
    /// Member-level mean criticality
    pub avg_criticality: f64,
    /// Member-level highest criticality
    pub max_criticality: u8,
    /// Member-level chronic disease count
    pub chronic_count: u32,
    /// Diagnosis code of the claim
    pub diagnosis_code: String,
    /// Procedure code of the claim
    pub procedure_code: Option<String>,
    /// Billed amount of the claim
    pub amount_billed: Option<f64>,
}

impl ClaimFeatureRow {
    /// Join a normalized claim with the aggregate of the member it belongs to
    #[must_use]
    pub fn join(claim: &ClaimRecord, profile: &PatientFeatureRecord) -> Self {
        Self {
            member_id: claim.member_id.clone(),
            claim_id: claim.claim_id.clone(),
            age: claim.age,
            gender: claim.gender.clone(),
            num_claims: profile.num_claims,
            unique_diseases: profile.unique_diseases,
            avg_criticality: profile.avg_criticality,
            max_criticality: profile.max_criticality,
            chronic_count: profile.chronic_count,
            diagnosis_code: claim.diagnosis_code.clone(),
            procedure_code: claim.procedure_code.clone(),
            amount_billed: claim.amount_billed,
        }
    }
}

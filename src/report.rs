//! Patient summary table
//!
//! One row per profiled member, combining the aggregated features, the
//! rule-based risk class and, when a classifier was served, the predicted
//! class. The representative diagnosis and procedure are the member's most
//! frequent catalogued codes, ties going to the earliest occurrence.
//!
//! A member whose prediction failed carries the error in `PredictionError`
//! and has no recommendation; it never falls back to the rule-based class.

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::algorithm::health::catalog::{DiseaseCatalog, OrganSystem, UNKNOWN_DISEASE};
use crate::algorithm::health::scoring::{Recommendation, RiskClass};
use crate::models::claim::ClaimRecord;
use crate::pipeline::{MemberPredictions, PipelineOutput};

/// One row of the output table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    #[serde(rename = "MemberID")]
    pub member_id: String,
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "DiagnosisCode")]
    pub diagnosis_code: Option<String>,
    #[serde(rename = "ProcedureCode")]
    pub procedure_code: Option<String>,
    #[serde(rename = "DiseaseName")]
    pub disease_name: String,
    #[serde(rename = "OrganSystem")]
    pub organ_system: String,
    #[serde(rename = "NumClaims")]
    pub num_claims: u32,
    #[serde(rename = "UniqueDiseases")]
    pub unique_diseases: u32,
    #[serde(rename = "AvgCriticality")]
    pub avg_criticality: f64,
    #[serde(rename = "MaxCriticality")]
    pub max_criticality: u8,
    #[serde(rename = "ChronicCount")]
    pub chronic_count: u32,
    #[serde(rename = "RiskScore")]
    pub risk_score: Option<u8>,
    #[serde(rename = "PredictedRisk")]
    pub predicted_risk: Option<u8>,
    #[serde(rename = "PreventiveCareAdvice")]
    pub preventive_care_advice: String,
    #[serde(rename = "Recommendation")]
    pub recommendation: Option<String>,
    #[serde(rename = "PredictionError")]
    pub prediction_error: Option<String>,
}

/// Most frequent value; ties go to the value seen first
fn most_frequent<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: FxHashMap<&str, (usize, usize)> = FxHashMap::default();
    for (position, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}

/// Build the summary table, sorted by member
#[must_use]
pub fn build_summaries(
    output: &PipelineOutput,
    catalog: &DiseaseCatalog,
    predictions: Option<&MemberPredictions>,
) -> Vec<PatientSummary> {
    let mut claims_by_member: FxHashMap<&str, Vec<&ClaimRecord>> = FxHashMap::default();
    for claim in &output.claims {
        if catalog.disease_for(&claim.diagnosis_code).is_known() {
            claims_by_member
                .entry(claim.member_id.as_str())
                .or_default()
                .push(claim);
        }
    }

    output
        .profiles
        .iter()
        .sorted_by(|a, b| a.member_id.cmp(&b.member_id))
        .map(|profile| {
            let claims = claims_by_member
                .get(profile.member_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let diagnosis =
                most_frequent(claims.iter().map(|claim| claim.diagnosis_code.as_str()));
            let procedure =
                most_frequent(claims.iter().filter_map(|claim| claim.procedure_code.as_deref()));

            let predicted: Option<RiskClass> = predictions
                .and_then(|p| p.predicted.get(&profile.member_id))
                .copied();
            let failure = predictions.and_then(|p| p.failure_for(&profile.member_id));
            let recommendation = match failure {
                Some(_) => None,
                None => Some(
                    predicted
                        .or(profile.risk_score)
                        .map_or(Recommendation::LowRisk, RiskClass::recommendation)
                        .label()
                        .to_string(),
                ),
            };

            PatientSummary {
                member_id: profile.member_id.clone(),
                age: profile.age,
                gender: profile.gender.clone(),
                diagnosis_code: diagnosis.map(str::to_string),
                procedure_code: procedure.map(str::to_string),
                disease_name: diagnosis
                    .map_or(UNKNOWN_DISEASE, |code| catalog.disease_for(code).name())
                    .to_string(),
                organ_system: diagnosis
                    .map_or(OrganSystem::Unknown, |code| catalog.organ_system(code))
                    .display_name()
                    .to_string(),
                num_claims: profile.num_claims,
                unique_diseases: profile.unique_diseases,
                avg_criticality: profile.avg_criticality,
                max_criticality: profile.max_criticality,
                chronic_count: profile.chronic_count,
                risk_score: profile.risk_score.map(RiskClass::as_u8),
                predicted_risk: predicted.map(RiskClass::as_u8),
                preventive_care_advice: profile.preventive_care_advice.clone(),
                recommendation,
                prediction_error: failure.map(|f| f.error.to_string()),
            }
        })
        .collect()
}

//! Shared fixtures for integration tests

use claim_risk::{ClassifierConfig, PatientFeatureRecord, PipelineConfig, RawClaim};
use rustc_hash::FxHashMap;

/// Diagnosis codes cycled through by [`synthetic_claims`], lowest to highest criticality
pub const SYNTHETIC_CODES: [&str; 10] = [
    "Z00", "R51", "M54", "K21", "J45", "I10", "E11", "N18", "I25", "C50",
];

/// A fully populated raw claim with fixed demographics
#[must_use]
pub fn claim(member: &str, claim_id: &str, diagnosis: &str, procedure: &str) -> RawClaim {
    RawClaim::new(member, claim_id, 50.0, "F", diagnosis, procedure, 120.0)
}

/// Deterministic claim table spread across the risk classes
///
/// Member `i` has `i % 6 + 1` claims; higher member numbers lean toward more
/// severe codes so every risk class is represented.
#[must_use]
pub fn synthetic_claims(members: usize) -> Vec<RawClaim> {
    let mut rows = Vec::new();
    for i in 0..members {
        let member = format!("M{i:03}");
        let gender = if i % 2 == 0 { "F" } else { "Male" };
        let n_claims = i % 6 + 1;
        let severity = i * SYNTHETIC_CODES.len() / members.max(1);
        for j in 0..n_claims {
            let code = SYNTHETIC_CODES[(severity + j * 3) % SYNTHETIC_CODES.len()];
            rows.push(RawClaim::new(
                &member,
                &format!("C{i:03}-{j}"),
                20.0 + (i % 60) as f64,
                gender,
                code,
                &format!("P{}", j % 3),
                100.0 + (i * 7 + j) as f64,
            ));
        }
    }
    rows
}

/// Pipeline configuration that keeps tests single-threaded and quiet
#[must_use]
pub fn test_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        parallel_aggregation: false,
        worker_threads: 1,
        classifier: small_classifier_config(),
        ..PipelineConfig::default()
    }
}

/// A small, fast forest configuration without progress output
#[must_use]
pub fn small_classifier_config() -> ClassifierConfig {
    ClassifierConfig {
        n_trees: 10,
        max_depth: 6,
        min_samples_split: 2,
        min_samples_leaf: 1,
        cv_folds: 3,
        balance_target: Some(20),
        show_progress: false,
        ..ClassifierConfig::default()
    }
}

/// Index feature records by member
#[must_use]
pub fn by_member(records: &[PatientFeatureRecord]) -> FxHashMap<String, PatientFeatureRecord> {
    records
        .iter()
        .map(|record| (record.member_id.clone(), record.clone()))
        .collect()
}

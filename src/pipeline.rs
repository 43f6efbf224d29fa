//! Batch risk pipeline
//!
//! Runs the rule-based stages in order: normalize raw claim rows, aggregate
//! catalogued claims per member and score each member. The output also
//! assembles the claim-level rows the classifier trains on and predicts for.

use std::time::Instant;

use log::{info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::algorithm::classifier::service::ClassifierService;
use crate::algorithm::health::aggregate::{AggregationReport, FeatureAggregator};
use crate::algorithm::health::catalog::DiseaseCatalog;
use crate::algorithm::health::normalize::{ClaimNormalizer, NormalizationReport};
use crate::algorithm::health::scoring::{RiskClass, RuleBasedScorer};
use crate::config::PipelineConfig;
use crate::error::{Result, RiskError};
use crate::models::claim::{ClaimRecord, RawClaim};
use crate::models::features::{ClaimFeatureRow, PatientFeatureRecord};

/// Everything one pipeline run produces
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Normalized claim records, input order
    pub claims: Vec<ClaimRecord>,
    /// Scored feature records, one per profiled member
    pub profiles: Vec<PatientFeatureRecord>,
    /// Normalization counts
    pub normalization: NormalizationReport,
    /// Aggregation counts
    pub aggregation: AggregationReport,
}

impl PipelineOutput {
    /// Feature records keyed by member
    #[must_use]
    pub fn profiles_by_member(&self) -> FxHashMap<&str, &PatientFeatureRecord> {
        self.profiles
            .iter()
            .map(|profile| (profile.member_id.as_str(), profile))
            .collect()
    }

    /// First normalized row of every claim of every profiled member, joined
    /// with that member's features
    #[must_use]
    pub fn claim_rows(&self) -> Vec<ClaimFeatureRow> {
        let profiles = self.profiles_by_member();
        let mut seen: FxHashSet<(&str, &str)> = FxHashSet::default();

        self.claims
            .iter()
            .filter_map(|claim| {
                let profile = profiles.get(claim.member_id.as_str())?;
                seen.insert((claim.member_id.as_str(), claim.claim_id.as_str()))
                    .then(|| ClaimFeatureRow::join(claim, profile))
            })
            .collect()
    }

    /// Claim rows labelled with their member's rule-based risk class
    #[must_use]
    pub fn training_set(&self) -> (Vec<ClaimFeatureRow>, Vec<RiskClass>) {
        let labels: FxHashMap<&str, RiskClass> = self
            .profiles
            .iter()
            .filter_map(|p| p.risk_score.map(|score| (p.member_id.as_str(), score)))
            .collect();

        self.claim_rows()
            .into_iter()
            .filter_map(|row| {
                let label = *labels.get(row.member_id.as_str())?;
                Some((row, label))
            })
            .unzip()
    }
}

/// A claim row the classifier could not score
#[derive(Debug)]
pub struct PredictionFailure {
    pub member_id: String,
    pub claim_id: String,
    pub error: RiskError,
}

/// Per-member classifier output
///
/// A member with any failed row has no entry in `predicted`.
#[derive(Debug, Default)]
pub struct MemberPredictions {
    /// Highest predicted class across each member's claim rows
    pub predicted: FxHashMap<String, RiskClass>,
    /// Rows that failed to encode or predict
    pub failures: Vec<PredictionFailure>,
}

impl MemberPredictions {
    /// First failure recorded for a member, if any
    #[must_use]
    pub fn failure_for(&self, member_id: &str) -> Option<&PredictionFailure> {
        self.failures
            .iter()
            .find(|failure| failure.member_id == member_id)
    }

    /// Members whose prediction was withheld
    #[must_use]
    pub fn failed_members(&self) -> FxHashSet<&str> {
        self.failures
            .iter()
            .map(|failure| failure.member_id.as_str())
            .collect()
    }
}

/// Orchestrates normalization, aggregation and scoring
#[derive(Debug, Clone, Copy)]
pub struct RiskPipeline<'a> {
    catalog: &'a DiseaseCatalog,
    config: &'a PipelineConfig,
}

impl<'a> RiskPipeline<'a> {
    #[must_use]
    pub const fn new(catalog: &'a DiseaseCatalog, config: &'a PipelineConfig) -> Self {
        Self { catalog, config }
    }

    /// Run the rule-based stages over a raw claim table
    #[must_use]
    pub fn run(&self, rows: &[RawClaim]) -> PipelineOutput {
        let start = Instant::now();

        let normalized = ClaimNormalizer::new(self.config.code_delimiter).normalize(rows);
        let aggregated = FeatureAggregator::new(self.catalog)
            .with_parallel(self.config.parallel_aggregation)
            .aggregate(&normalized.records);

        let mut profiles = aggregated.records;
        RuleBasedScorer::new(self.config.scoring).score_all(&mut profiles);

        info!(
            "Pipeline scored {} members from {} raw rows in {:?}",
            profiles.len(),
            rows.len(),
            start.elapsed()
        );

        PipelineOutput {
            claims: normalized.records,
            profiles,
            normalization: normalized.report,
            aggregation: aggregated.report,
        }
    }
}

/// Predict every claim row and keep the highest class per member
///
/// Fails only when the service is not serving. Per-row failures are collected
/// in [`MemberPredictions::failures`] and withhold that member's prediction
/// entirely.
pub fn predict_members(
    service: &ClassifierService,
    output: &PipelineOutput,
) -> Result<MemberPredictions> {
    let rows = output.claim_rows();
    let results = service.predict_batch(&rows)?;

    let mut predictions = MemberPredictions::default();
    for (row, result) in rows.into_iter().zip(results) {
        match result {
            Ok(class) => {
                predictions
                    .predicted
                    .entry(row.member_id)
                    .and_modify(|current| *current = (*current).max(class))
                    .or_insert(class);
            }
            Err(error) => predictions.failures.push(PredictionFailure {
                member_id: row.member_id,
                claim_id: row.claim_id,
                error,
            }),
        }
    }

    if let Some(first) = predictions.failures.first() {
        let failed: FxHashSet<String> = predictions
            .failed_members()
            .into_iter()
            .map(str::to_string)
            .collect();
        predictions
            .predicted
            .retain(|member_id, _| !failed.contains(member_id));
        warn!(
            "{} claim rows could not be predicted; withheld predictions for {} members; first failure: {}",
            predictions.failures.len(),
            failed.len(),
            first.error
        );
    }
    Ok(predictions)
}

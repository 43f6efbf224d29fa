//! Per-patient feature aggregation
//!
//! Groups normalized claims by member, enriches each claim through the disease
//! catalog and reduces the catalogued claims to one `PatientFeatureRecord` per
//! member. Claims whose code is not catalogued are excluded; a member with no
//! catalogued claims produces no record.
//!
//! A claim line is a distinct (claim, diagnosis) pair. Procedure explosion
//! therefore never inflates `num_claims` or weights the mean criticality.

use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::algorithm::health::catalog::DiseaseCatalog;
use crate::models::claim::ClaimRecord;
use crate::models::features::PatientFeatureRecord;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Separator between distinct advice texts
pub const ADVICE_SEPARATOR: &str = "; ";

/// Counts describing one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationReport {
    /// Distinct members in the input
    pub members_seen: usize,
    /// Members that produced a feature record
    pub members_profiled: usize,
    /// Claim records excluded for an uncatalogued diagnosis code
    pub excluded_claims: usize,
}

/// Output of an aggregation pass
#[derive(Debug, Clone, Default)]
pub struct AggregatedFeatures {
    /// One record per profiled member; order is not significant
    pub records: Vec<PatientFeatureRecord>,
    /// Aggregation counts
    pub report: AggregationReport,
}

/// Reduces normalized claims to per-member feature records
#[derive(Debug, Clone, Copy)]
pub struct FeatureAggregator<'a> {
    catalog: &'a DiseaseCatalog,
    parallel: bool,
}

impl<'a> FeatureAggregator<'a> {
    /// Create an aggregator backed by `catalog`
    #[must_use]
    pub const fn new(catalog: &'a DiseaseCatalog) -> Self {
        Self {
            catalog,
            parallel: true,
        }
    }

    /// Enable or disable parallel aggregation across members
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Aggregate all claims into per-member feature records
    #[must_use]
    pub fn aggregate(&self, claims: &[ClaimRecord]) -> AggregatedFeatures {
        let start = Instant::now();
        log_operation_start("Aggregating patient features from claims", claims.len());

        let groups = group_by_member(claims);
        let excluded_claims = claims
            .iter()
            .filter(|claim| !self.catalog.disease_for(&claim.diagnosis_code).is_known())
            .count();

        let records: Vec<PatientFeatureRecord> = if self.parallel {
            groups
                .par_iter()
                .filter_map(|(member_id, rows)| self.aggregate_member(member_id, rows))
                .collect()
        } else {
            groups
                .iter()
                .filter_map(|(member_id, rows)| self.aggregate_member(member_id, rows))
                .collect()
        };

        let report = AggregationReport {
            members_seen: groups.len(),
            members_profiled: records.len(),
            excluded_claims,
        };
        if excluded_claims > 0 {
            warn!(
                "Excluded {excluded_claims} claims with uncatalogued diagnosis codes; {} of {} members profiled",
                report.members_profiled, report.members_seen
            );
        }
        log_operation_complete("aggregated", records.len(), Some(start.elapsed()));

        AggregatedFeatures { records, report }
    }

    /// Aggregate one member's claims; `None` when no claim is catalogued
    #[must_use]
    pub fn aggregate_member(
        &self,
        member_id: &str,
        rows: &[&ClaimRecord],
    ) -> Option<PatientFeatureRecord> {
        let mut first_row: Option<&ClaimRecord> = None;
        let mut claim_lines: FxHashSet<(&str, &str)> = FxHashSet::default();
        let mut criticality_sum = 0u32;
        let mut max_criticality = 0u8;
        let mut seen_diseases: FxHashSet<&str> = FxHashSet::default();
        let mut diseases: Vec<String> = Vec::new();
        let mut chronic_count = 0u32;
        let mut seen_advice: FxHashSet<&str> = FxHashSet::default();
        let mut advice: Vec<&str> = Vec::new();

        for &row in rows {
            let Some(entry) = self.catalog.disease_for(&row.diagnosis_code).entry() else {
                debug!(
                    "Member {member_id}: excluding uncatalogued code {}",
                    row.diagnosis_code
                );
                continue;
            };
            first_row.get_or_insert(row);

            if claim_lines.insert((row.claim_id.as_str(), row.diagnosis_code.as_str())) {
                let level = entry.criticality.as_u8();
                criticality_sum += u32::from(level);
                max_criticality = max_criticality.max(level);
            }

            if seen_diseases.insert(entry.name.as_str()) {
                diseases.push(entry.name.clone());
                if entry.criticality.is_chronic() {
                    chronic_count += 1;
                }
                if seen_advice.insert(entry.advice.as_str()) {
                    advice.push(entry.advice.as_str());
                }
            }
        }

        let first_row = first_row?;
        let num_claims = claim_lines.len() as u32;

        Some(PatientFeatureRecord {
            member_id: member_id.to_string(),
            age: first_row.age,
            gender: first_row.gender.clone(),
            num_claims,
            unique_diseases: diseases.len() as u32,
            avg_criticality: f64::from(criticality_sum) / f64::from(num_claims),
            max_criticality,
            chronic_count,
            preventive_care_advice: advice.join(ADVICE_SEPARATOR),
            diseases,
            risk_score: None,
        })
    }
}

/// Group claims by member, keeping members in first-seen order
#[must_use]
pub fn group_by_member(claims: &[ClaimRecord]) -> Vec<(&str, Vec<&ClaimRecord>)> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<(&str, Vec<&ClaimRecord>)> = Vec::new();

    for claim in claims {
        let slot = *index.entry(claim.member_id.as_str()).or_insert_with(|| {
            groups.push((claim.member_id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(claim);
    }

    groups
}

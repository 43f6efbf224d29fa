//! Health data processing algorithms
//!
//! This module implements the rule-based half of the pipeline: claim
//! normalization, disease cataloguing, per-patient aggregation and scoring.

pub mod aggregate;
pub mod catalog;
pub mod normalize;
pub mod scoring;

// Re-export common types
pub use aggregate::{AggregatedFeatures, AggregationReport, FeatureAggregator};
pub use catalog::{Criticality, DiseaseCatalog, DiseaseEntry, DiseaseMatch, OrganSystem};
pub use normalize::{ClaimNormalizer, NormalizationReport, NormalizedClaims};
pub use scoring::{Recommendation, RiskClass, RuleBasedScorer};

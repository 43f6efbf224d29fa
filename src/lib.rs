//! A Rust library for claim-level patient risk profiling.
//!
//! Raw claim rows are normalized into one-diagnosis/one-procedure records,
//! enriched through a disease catalog, aggregated into per-patient features and
//! scored by a deterministic rule set. A random forest can be trained on the
//! rule-based labels and served as a drop-in replacement for the score.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;

// Re-export the most common types for easier use
pub use config::{ClassifierConfig, PipelineConfig, ScoringConfig};
pub use error::{Result, RiskError};
pub use models::{ClaimFeatureRow, ClaimRecord, PatientFeatureRecord, RawClaim};

// Rule-based stages
pub use algorithm::health::{
    ClaimNormalizer, Criticality, DiseaseCatalog, DiseaseEntry, DiseaseMatch, FeatureAggregator,
    OrganSystem, Recommendation, RiskClass, RuleBasedScorer,
};

// Classifier
pub use algorithm::classifier::{
    ClassifierService, EncoderSet, Encoding, ModelBundle, ServiceState, TrainingReport,
};

// Orchestration and output
pub use pipeline::{MemberPredictions, PipelineOutput, RiskPipeline, predict_members};
pub use report::{PatientSummary, build_summaries};
pub use utils::{read_claims, write_table};

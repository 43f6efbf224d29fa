//! Configuration for the claim risk pipeline.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Weights applied to each aggregated feature by the rule-based scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the highest criticality
    pub max_criticality: f64,
    /// Weight of the mean criticality
    pub avg_criticality: f64,
    /// Weight of the distinct disease count
    pub unique_diseases: f64,
    /// Weight of the chronic disease count
    pub chronic_count: f64,
    /// Weight of the (capped) claim count
    pub num_claims: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            max_criticality: 1.5,
            avg_criticality: 1.2,
            unique_diseases: 0.8,
            chronic_count: 2.0,
            num_claims: 0.3,
        }
    }
}

/// Inclusive lower bounds of the raw score for each risk class above 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Lower bound for class 5
    pub critical: f64,
    /// Lower bound for class 4
    pub high: f64,
    /// Lower bound for class 3
    pub elevated: f64,
    /// Lower bound for class 2
    pub moderate: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical: 20.0,
            high: 15.0,
            elevated: 10.0,
            moderate: 6.0,
        }
    }
}

/// Configuration for the rule-based scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Feature weights
    pub weights: ScoringWeights,
    /// Class thresholds
    pub thresholds: RiskThresholds,
    /// Claim count above which claim volume stops adding to the score
    pub claim_cap: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            thresholds: RiskThresholds::default(),
            claim_cap: 10,
        }
    }
}

/// Configuration for classifier training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum number of samples required to split a node
    pub min_samples_split: usize,
    /// Minimum number of samples in each leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (`None` = floor(sqrt(feature count)))
    pub max_features: Option<usize>,
    /// Share of rows held out for validation
    pub test_fraction: f64,
    /// Number of cross-validation folds
    pub cv_folds: usize,
    /// Seed for every random step (balancing, split, bootstrap)
    pub seed: u64,
    /// Rows per risk class after balancing (`None` disables balancing)
    pub balance_target: Option<usize>,
    /// Show an indicatif progress bar while fitting
    pub show_progress: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: None,
            test_fraction: 0.2,
            cv_folds: 5,
            seed: 42,
            balance_target: Some(100),
            show_progress: true,
        }
    }
}

impl ClassifierConfig {
    /// Check that the hyper-parameters describe a trainable forest
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(RiskError::Config("n_trees must be at least 1".to_string()));
        }
        if self.min_samples_leaf == 0 {
            return Err(RiskError::Config(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(RiskError::Config(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.cv_folds == 1 {
            return Err(RiskError::Config(
                "cv_folds must be 0 (disabled) or at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Separator between multiple codes in one diagnosis/procedure field
    pub code_delimiter: char,
    /// Aggregate members in parallel with rayon
    pub parallel_aggregation: bool,
    /// Size of the rayon worker pool
    pub worker_threads: usize,
    /// Rule-based scorer settings
    pub scoring: ScoringConfig,
    /// Classifier settings
    pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            code_delimiter: ';',
            parallel_aggregation: true,
            worker_threads: num_cpus::get(),
            scoring: ScoringConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.classifier.validate()?;
        Ok(config)
    }

    /// Apply `CLAIM_RISK_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(seed) = env_value::<u64>("CLAIM_RISK_SEED") {
            self.classifier.seed = seed;
        }
        if let Some(trees) = env_value::<usize>("CLAIM_RISK_TREES") {
            self.classifier.n_trees = trees;
        }
        if let Some(threads) = env_value::<usize>("CLAIM_RISK_THREADS") {
            self.worker_threads = threads.max(1);
        }
        self
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Code Delimiter: '{}'", self.code_delimiter)?;
        writeln!(f, "  Parallel Aggregation: {}", self.parallel_aggregation)?;
        writeln!(f, "  Worker Threads: {}", self.worker_threads)?;
        writeln!(f, "  Claim Cap: {}", self.scoring.claim_cap)?;
        writeln!(f, "  Trees: {}", self.classifier.n_trees)?;
        writeln!(f, "  Max Depth: {}", self.classifier.max_depth)?;
        writeln!(f, "  Seed: {}", self.classifier.seed)?;
        if let Some(target) = self.classifier.balance_target {
            writeln!(f, "  Balance Target: {target} rows per class")?;
        }
        Ok(())
    }
}

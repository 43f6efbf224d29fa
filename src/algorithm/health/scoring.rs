//! Rule-based risk scoring
//!
//! A weighted sum of aggregated features mapped onto five risk classes by
//! fixed thresholds. The scorer is pure: the same record always yields the same
//! class. It also produces the labels the classifier is trained to reproduce.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::models::features::PatientFeatureRecord;

/// Discrete patient risk class, 1 (lowest) to 5 (highest)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum RiskClass {
    /// Class 1
    Minimal = 1,
    /// Class 2
    Low = 2,
    /// Class 3
    Moderate = 3,
    /// Class 4
    High = 4,
    /// Class 5
    Critical = 5,
}

impl RiskClass {
    /// Number of risk classes
    pub const COUNT: usize = 5;

    /// Convert a numeric class (1-5) to `RiskClass`
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Minimal),
            2 => Some(Self::Low),
            3 => Some(Self::Moderate),
            4 => Some(Self::High),
            5 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Numeric class value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Zero-based index, for per-class arrays
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// Inverse of [`RiskClass::index`]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Self::from_u8(index as u8 + 1)
        } else {
            None
        }
    }

    /// All classes in ascending order
    #[must_use]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Minimal,
            Self::Low,
            Self::Moderate,
            Self::High,
            Self::Critical,
        ]
    }

    /// Recommendation bucket for this class
    #[must_use]
    pub const fn recommendation(self) -> Recommendation {
        Recommendation::for_score(self.as_u8())
    }
}

impl From<RiskClass> for u8 {
    fn from(class: RiskClass) -> Self {
        class.as_u8()
    }
}

impl TryFrom<u8> for RiskClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or_else(|| format!("risk class out of range: {value}"))
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Follow-up bucket derived from a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    /// Score above 4
    ImmediateAttention,
    /// Score above 2
    MonitorClosely,
    /// Anything else
    LowRisk,
}

impl Recommendation {
    /// Bucket a numeric score
    #[must_use]
    pub const fn for_score(score: u8) -> Self {
        if score > 4 {
            Self::ImmediateAttention
        } else if score > 2 {
            Self::MonitorClosely
        } else {
            Self::LowRisk
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ImmediateAttention => "Immediate Attention",
            Self::MonitorClosely => "Monitor Closely",
            Self::LowRisk => "Low Risk",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Converts aggregated features into a risk class
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuleBasedScorer {
    config: ScoringConfig,
}

impl RuleBasedScorer {
    /// Create a scorer with explicit weights and thresholds
    #[must_use]
    pub const fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Weighted raw score before thresholding
    #[must_use]
    pub fn raw_score(&self, features: &PatientFeatureRecord) -> f64 {
        let weights = &self.config.weights;
        let capped_claims = features.num_claims.min(self.config.claim_cap);

        weights.max_criticality * f64::from(features.max_criticality)
            + weights.avg_criticality * features.avg_criticality
            + weights.unique_diseases * f64::from(features.unique_diseases)
            + weights.chronic_count * f64::from(features.chronic_count)
            + weights.num_claims * f64::from(capped_claims)
    }

    /// Risk class of a feature record
    #[must_use]
    pub fn score(&self, features: &PatientFeatureRecord) -> RiskClass {
        self.classify(self.raw_score(features))
    }

    /// Map a raw score onto a risk class, highest threshold first
    #[must_use]
    pub fn classify(&self, raw: f64) -> RiskClass {
        let thresholds = &self.config.thresholds;
        if raw >= thresholds.critical {
            RiskClass::Critical
        } else if raw >= thresholds.high {
            RiskClass::High
        } else if raw >= thresholds.elevated {
            RiskClass::Moderate
        } else if raw >= thresholds.moderate {
            RiskClass::Low
        } else {
            RiskClass::Minimal
        }
    }

    /// Populate the risk score of every record
    pub fn score_all(&self, records: &mut [PatientFeatureRecord]) {
        for record in records.iter_mut() {
            record.risk_score = Some(self.score(record));
        }
    }
}

//! Organ-system categories for diagnosis codes
//!
//! A coarse classification of ICD-10 codes by their leading letter. It is
//! independent of the disease table and is only used for reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Organ-system categories keyed on the first character of a diagnosis code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganSystem {
    /// A and B codes
    Infectious,
    /// C codes
    Cancer,
    /// D codes
    Blood,
    /// E codes
    EndocrineMetabolic,
    /// F codes
    Mental,
    /// G codes
    Neurological,
    /// H codes
    EyeEar,
    /// I codes
    Cardiovascular,
    /// J codes
    Respiratory,
    /// K codes
    Digestive,
    /// L codes
    Skin,
    /// M codes
    Musculoskeletal,
    /// N codes
    Genitourinary,
    /// O codes
    Pregnancy,
    /// P codes
    Perinatal,
    /// Q codes
    Congenital,
    /// R codes
    GeneralSymptoms,
    /// S and T codes
    Injury,
    /// Z codes
    HealthStatus,
    /// Empty code or an unmapped leading letter
    Unknown,
}

impl OrganSystem {
    /// Classify a diagnosis code by its leading letter
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let Some(first) = code.trim().chars().next() else {
            return Self::Unknown;
        };

        match first.to_ascii_uppercase() {
            'A' | 'B' => Self::Infectious,
            'C' => Self::Cancer,
            'D' => Self::Blood,
            'E' => Self::EndocrineMetabolic,
            'F' => Self::Mental,
            'G' => Self::Neurological,
            'H' => Self::EyeEar,
            'I' => Self::Cardiovascular,
            'J' => Self::Respiratory,
            'K' => Self::Digestive,
            'L' => Self::Skin,
            'M' => Self::Musculoskeletal,
            'N' => Self::Genitourinary,
            'O' => Self::Pregnancy,
            'P' => Self::Perinatal,
            'Q' => Self::Congenital,
            'R' => Self::GeneralSymptoms,
            'S' | 'T' => Self::Injury,
            'Z' => Self::HealthStatus,
            _ => Self::Unknown,
        }
    }

    /// Get the display name for this category
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Infectious => "Infectious diseases",
            Self::Cancer => "Cancer",
            Self::Blood => "Blood disorders",
            Self::EndocrineMetabolic => "Endocrine/Metabolic",
            Self::Mental => "Mental disorders",
            Self::Neurological => "Neurological disorders",
            Self::EyeEar => "Eye/Ear diseases",
            Self::Cardiovascular => "Cardiovascular",
            Self::Respiratory => "Respiratory",
            Self::Digestive => "Digestive",
            Self::Skin => "Skin diseases",
            Self::Musculoskeletal => "Musculoskeletal",
            Self::Genitourinary => "Genitourinary",
            Self::Pregnancy => "Pregnancy-related",
            Self::Perinatal => "Perinatal conditions",
            Self::Congenital => "Congenital anomalies",
            Self::GeneralSymptoms => "General symptoms",
            Self::Injury => "Injuries and poisonings",
            Self::HealthStatus => "General health status",
            Self::Unknown => "Unknown",
        }
    }

    /// Get all categories, `Unknown` last
    #[must_use]
    pub fn all_categories() -> Vec<Self> {
        vec![
            Self::Infectious,
            Self::Cancer,
            Self::Blood,
            Self::EndocrineMetabolic,
            Self::Mental,
            Self::Neurological,
            Self::EyeEar,
            Self::Cardiovascular,
            Self::Respiratory,
            Self::Digestive,
            Self::Skin,
            Self::Musculoskeletal,
            Self::Genitourinary,
            Self::Pregnancy,
            Self::Perinatal,
            Self::Congenital,
            Self::GeneralSymptoms,
            Self::Injury,
            Self::HealthStatus,
            Self::Unknown,
        ]
    }
}

impl fmt::Display for OrganSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

//! Criticality levels for catalogued diseases
//!
//! Criticality is a 1-5 severity assigned to each disease in the catalog.
//! Diseases at `High` or above count as chronic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Criticality levels for catalogued diseases
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Criticality {
    /// Routine contact (e.g., general check-up)
    Minimal = 1,
    /// Low burden (e.g., back pain, headache)
    Low = 2,
    /// Moderate burden (e.g., hypertension, asthma)
    Moderate = 3,
    /// High, long-term burden (e.g., diabetes, COPD)
    High = 4,
    /// Life-threatening (e.g., cancer, heart failure)
    Critical = 5,
}

impl Criticality {
    /// Lowest criticality that counts a disease as chronic
    pub const CHRONIC_THRESHOLD: Self = Self::High;

    /// Convert a numeric level (1-5) to `Criticality`
    #[must_use]
    pub const fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Minimal),
            2 => Some(Self::Low),
            3 => Some(Self::Moderate),
            4 => Some(Self::High),
            5 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Get the numeric value for this level
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether a disease at this level is treated as chronic
    #[must_use]
    pub fn is_chronic(self) -> bool {
        self >= Self::CHRONIC_THRESHOLD
    }

    /// Get a descriptive name for this level
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl From<Criticality> for u8 {
    fn from(level: Criticality) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for Criticality {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_u8(level).ok_or_else(|| format!("criticality out of range: {level}"))
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

//! Disease catalog
//!
//! This module maps ICD-style diagnosis codes to a disease name, a criticality
//! and preventive-care advice. Lookup is on the first three characters of the
//! trimmed, upper-cased code. The catalog is built once and shared by
//! reference; nothing mutates it after construction.

pub mod categories;
pub mod criticality;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub use categories::OrganSystem;
pub use criticality::Criticality;

/// Length of the code prefix used as the catalog key
pub const PREFIX_LEN: usize = 3;

/// Name reported for codes without a catalog entry
pub const UNKNOWN_DISEASE: &str = "Unknown";

/// One row of the disease catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseEntry {
    /// Three-character code prefix
    pub code_prefix: String,
    /// Disease name
    pub name: String,
    /// Severity of the disease
    pub criticality: Criticality,
    /// Preventive-care advice text
    pub advice: String,
}

impl DiseaseEntry {
    /// Create a catalog entry
    #[must_use]
    pub fn new(code_prefix: &str, name: &str, criticality: Criticality, advice: &str) -> Self {
        Self {
            code_prefix: code_prefix.to_uppercase(),
            name: name.to_string(),
            criticality,
            advice: advice.to_string(),
        }
    }
}

/// Result of looking up a diagnosis code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiseaseMatch<'a> {
    /// The code prefix is catalogued
    Known(&'a DiseaseEntry),
    /// The code prefix is not catalogued; criticality is absent
    Unknown,
}

impl<'a> DiseaseMatch<'a> {
    /// The matched entry, if any
    #[must_use]
    pub const fn entry(self) -> Option<&'a DiseaseEntry> {
        match self {
            Self::Known(entry) => Some(entry),
            Self::Unknown => None,
        }
    }

    /// Disease name, `"Unknown"` for uncatalogued codes
    #[must_use]
    pub fn name(self) -> &'a str {
        match self {
            Self::Known(entry) => &entry.name,
            Self::Unknown => UNKNOWN_DISEASE,
        }
    }

    /// Criticality of the matched disease; `None` for uncatalogued codes
    #[must_use]
    pub fn criticality(self) -> Option<Criticality> {
        self.entry().map(|entry| entry.criticality)
    }

    /// Whether the code matched a catalog entry
    #[must_use]
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }
}

const STANDARD_TABLE: &[(&str, &str, Criticality, &str)] = &[
    ("E10", "Type 1 Diabetes", Criticality::High, "Regular insulin monitoring and diet control"),
    ("E11", "Type 2 Diabetes", Criticality::High, "Weight management, avoid sugar, regular A1C tests"),
    ("E13", "Other Diabetes", Criticality::High, "Monitor glucose, exercise, low-carb diet"),
    ("I10", "Hypertension", Criticality::Moderate, "Reduce salt, regular BP check, avoid stress"),
    ("I25", "Heart Disease", Criticality::Critical, "Cardiologist visit, ECG, physical activity"),
    ("I50", "Heart Failure", Criticality::Critical, "Low sodium diet, daily weight check, medications"),
    ("J44", "COPD", Criticality::High, "Avoid smoking, pulmonary rehab, flu vaccination"),
    ("J45", "Asthma", Criticality::Moderate, "Use inhalers regularly, avoid triggers, annual checkups"),
    ("J18", "Pneumonia", Criticality::High, "Vaccination, hygiene, timely antibiotics"),
    ("N18", "Kidney Disease", Criticality::High, "Limit protein/sodium, regular blood/urine tests"),
    ("C50", "Breast Cancer", Criticality::Critical, "Mammograms, regular check-ups, self-exams"),
    ("C34", "Lung Cancer", Criticality::Critical, "Quit smoking, screening for early detection"),
    ("C18", "Colon Cancer", Criticality::Critical, "Colonoscopy, high-fiber diet, routine screening"),
    ("F32", "Depression", Criticality::Moderate, "Therapy, medication, regular mental health checks"),
    ("F20", "Schizophrenia", Criticality::High, "Psychiatric care, medication adherence"),
    ("G30", "Alzheimer's Disease", Criticality::High, "Memory exercises, caregiver support"),
    ("M54", "Back Pain", Criticality::Low, "Stretching, physiotherapy, avoid heavy lifting"),
    ("K21", "Acid Reflux", Criticality::Low, "Avoid spicy food, small meals, raise head while sleeping"),
    ("K50", "Crohn's Disease", Criticality::Moderate, "Anti-inflammatory drugs, avoid trigger foods"),
    ("R51", "Headache", Criticality::Low, "Hydration, sleep, limit screen time"),
    ("R53", "Fatigue", Criticality::Low, "Balanced diet, sleep, manage stress"),
    ("Z00", "General Check-up", Criticality::Minimal, "Routine health screening and lifestyle advice"),
    ("Z51", "Palliative Care", Criticality::Critical, "Comfort-focused care and emotional support"),
];

/// Immutable prefix -> disease lookup table
#[derive(Debug, Clone)]
pub struct DiseaseCatalog {
    entries: Vec<DiseaseEntry>,
    by_prefix: FxHashMap<String, usize>,
}

impl Default for DiseaseCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl DiseaseCatalog {
    /// Build the standard 23-entry catalog
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries(
            STANDARD_TABLE
                .iter()
                .map(|&(prefix, name, criticality, advice)| {
                    DiseaseEntry::new(prefix, name, criticality, advice)
                })
                .collect(),
        )
    }

    /// Build a catalog from explicit entries; a repeated prefix keeps its first entry
    #[must_use]
    pub fn from_entries(entries: Vec<DiseaseEntry>) -> Self {
        let mut by_prefix = FxHashMap::default();
        for (idx, entry) in entries.iter().enumerate() {
            by_prefix.entry(entry.code_prefix.clone()).or_insert(idx);
        }
        Self { entries, by_prefix }
    }

    /// Look up the disease for a diagnosis code
    #[must_use]
    pub fn disease_for(&self, code: &str) -> DiseaseMatch<'_> {
        match code_prefix(code) {
            Some(prefix) => self
                .by_prefix
                .get(&prefix)
                .map_or(DiseaseMatch::Unknown, |&idx| {
                    DiseaseMatch::Known(&self.entries[idx])
                }),
            None => DiseaseMatch::Unknown,
        }
    }

    /// Coarse organ-system category of a diagnosis code
    #[must_use]
    pub fn organ_system(&self, code: &str) -> OrganSystem {
        OrganSystem::from_code(code)
    }

    /// All catalog entries in table order
    #[must_use]
    pub fn entries(&self) -> &[DiseaseEntry] {
        &self.entries
    }

    /// Number of catalogued prefixes
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

/// Catalog key of a code: its first three characters after trimming and upper-casing
fn code_prefix(code: &str) -> Option<String> {
    let clean_code = code.trim().to_uppercase();
    let prefix: String = clean_code.chars().take(PREFIX_LEN).collect();
    (prefix.chars().count() == PREFIX_LEN).then_some(prefix)
}

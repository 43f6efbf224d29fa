//! Categorical encodings
//!
//! An `Encoding` is a closed-world, bidirectional label <-> integer mapping
//! fitted once over a training corpus. Labels receive codes in order of first
//! observation, so refitting the same input yields the same encoding. Labels
//! not seen during fit cannot be encoded.
//!
//! Gender, diagnosis code and procedure code are encoded independently and
//! travel together as an `EncoderSet`, which also projects a claim row onto
//! the classifier's fixed-order feature vector.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, RiskError};
use crate::models::features::ClaimFeatureRow;

/// Field name of the gender encoding
pub const GENDER_FIELD: &str = "Gender";
/// Field name of the diagnosis code encoding
pub const DIAGNOSIS_FIELD: &str = "DiagnosisCode";
/// Field name of the procedure code encoding
pub const PROCEDURE_FIELD: &str = "ProcedureCode";

/// Number of classifier input features
pub const FEATURE_COUNT: usize = 10;

/// Classifier input features, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age",
    GENDER_FIELD,
    "NumClaims",
    "UniqueDiseases",
    "AvgCriticality",
    "MaxCriticality",
    "ChronicCount",
    DIAGNOSIS_FIELD,
    PROCEDURE_FIELD,
    "AmountBilled",
];

/// Numeric classifier input
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Bidirectional label <-> code mapping for one categorical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncodingRepr", into = "EncodingRepr")]
pub struct Encoding {
    field: String,
    labels: Vec<String>,
    index: FxHashMap<String, u32>,
}

#[derive(Serialize, Deserialize)]
struct EncodingRepr {
    field: String,
    labels: Vec<String>,
}

impl From<Encoding> for EncodingRepr {
    fn from(encoding: Encoding) -> Self {
        Self {
            field: encoding.field,
            labels: encoding.labels,
        }
    }
}

impl TryFrom<EncodingRepr> for Encoding {
    type Error = String;

    fn try_from(repr: EncodingRepr) -> std::result::Result<Self, Self::Error> {
        let encoding = Self::fit(&repr.field, &repr.labels);
        if encoding.labels.len() == repr.labels.len() {
            Ok(encoding)
        } else {
            Err(format!("duplicate labels in {} encoding", repr.field))
        }
    }
}

impl Encoding {
    /// Fit an encoding over every observed value of `field`
    #[must_use]
    pub fn fit<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels = Vec::new();
        let mut index = FxHashMap::default();

        for value in values {
            let value = value.as_ref();
            if !index.contains_key(value) {
                index.insert(value.to_string(), labels.len() as u32);
                labels.push(value.to_string());
            }
        }

        Self {
            field: field.to_string(),
            labels,
            index,
        }
    }

    /// Code of a label seen during fit
    pub fn encode(&self, label: &str) -> Result<u32> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| RiskError::UnknownCategoricalLabel {
                field: self.field.clone(),
                label: label.to_string(),
            })
    }

    /// Label of a fitted code
    pub fn decode(&self, code: u32) -> Result<&str> {
        self.labels
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| RiskError::UnknownCategoricalCode {
                field: self.field.clone(),
                code,
            })
    }

    /// Name of the encoded field
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Fitted labels in code order
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of fitted labels
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no label was fitted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Identity of this encoding: hex SHA-256 over the field name and ordered labels
    ///
    /// Every string is length-prefixed so label boundaries are part of the digest.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for value in std::iter::once(&self.field).chain(&self.labels) {
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Canonical gender label: trimmed, upper-cased, MALE/FEMALE shortened to M/F
#[must_use]
pub fn normalize_gender(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.as_str() {
        "MALE" => "M".to_string(),
        "FEMALE" => "F".to_string(),
        _ => upper,
    }
}

/// The three categorical encodings a classifier is trained against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSet {
    /// Gender encoding
    pub gender: Encoding,
    /// Diagnosis code encoding
    pub diagnosis: Encoding,
    /// Procedure code encoding
    pub procedure: Encoding,
}

impl EncoderSet {
    /// Fit all three encodings over the values present in `rows`
    #[must_use]
    pub fn fit(rows: &[ClaimFeatureRow]) -> Self {
        Self::fit_rows(rows.iter())
    }

    /// [`EncoderSet::fit`] over any re-iterable sequence of row references
    #[must_use]
    pub fn fit_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a ClaimFeatureRow>,
        I::IntoIter: Clone,
    {
        let rows = rows.into_iter();
        Self {
            gender: Encoding::fit(
                GENDER_FIELD,
                rows.clone()
                    .filter_map(|row| row.gender.as_deref())
                    .map(normalize_gender),
            ),
            diagnosis: Encoding::fit(
                DIAGNOSIS_FIELD,
                rows.clone().map(|row| row.diagnosis_code.as_str()),
            ),
            procedure: Encoding::fit(
                PROCEDURE_FIELD,
                rows.filter_map(|row| row.procedure_code.as_deref()),
            ),
        }
    }

    /// Fingerprints of the gender, diagnosis and procedure encodings
    #[must_use]
    pub fn fingerprints(&self) -> [String; 3] {
        [
            self.gender.fingerprint(),
            self.diagnosis.fingerprint(),
            self.procedure.fingerprint(),
        ]
    }

    /// Project a claim row onto the classifier feature vector
    pub fn encode_row(&self, row: &ClaimFeatureRow) -> Result<FeatureVector> {
        let missing = |field: &'static str| RiskError::MissingFeature {
            member_id: row.member_id.clone(),
            field,
        };

        let age = row.age.ok_or_else(|| missing("Age"))?;
        let gender = row.gender.as_deref().ok_or_else(|| missing(GENDER_FIELD))?;
        let procedure = row
            .procedure_code
            .as_deref()
            .ok_or_else(|| missing(PROCEDURE_FIELD))?;
        let amount_billed = row.amount_billed.ok_or_else(|| missing("AmountBilled"))?;

        Ok([
            age,
            f64::from(self.gender.encode(&normalize_gender(gender))?),
            f64::from(row.num_claims),
            f64::from(row.unique_diseases),
            row.avg_criticality,
            f64::from(row.max_criticality),
            f64::from(row.chronic_count),
            f64::from(self.diagnosis.encode(&row.diagnosis_code)?),
            f64::from(self.procedure.encode(procedure)?),
            amount_billed,
        ])
    }
}

//! Persisted model bundle
//!
//! A trained forest is only meaningful together with the three encodings its
//! feature vectors were built from. The bundle stores all four as JSON files in
//! one directory and records each encoding's fingerprint in the classifier
//! artifact, so a bundle assembled from mismatched files is rejected when it is
//! loaded rather than when it first predicts.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::algorithm::classifier::encoding::{
    DIAGNOSIS_FIELD, EncoderSet, Encoding, FEATURE_NAMES, FeatureVector, GENDER_FIELD,
    PROCEDURE_FIELD,
};
use crate::algorithm::classifier::forest::{ClassDistribution, RandomForest};
use crate::algorithm::health::scoring::RiskClass;
use crate::error::{Result, RiskError};
use crate::models::features::ClaimFeatureRow;
use crate::utils::logging::{log_file_operation_complete, log_file_operation_start};

/// Version of the on-disk bundle layout
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Classifier artifact file name
pub const CLASSIFIER_FILE: &str = "classifier.json";
/// Gender encoding file name
pub const GENDER_ENCODING_FILE: &str = "gender_encoding.json";
/// Diagnosis code encoding file name
pub const DIAGNOSIS_ENCODING_FILE: &str = "diagnosis_encoding.json";
/// Procedure code encoding file name
pub const PROCEDURE_ENCODING_FILE: &str = "procedure_encoding.json";

/// Fingerprints of the encodings a forest was trained against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingFingerprints {
    pub gender: String,
    pub diagnosis: String,
    pub procedure: String,
}

impl From<&EncoderSet> for EncodingFingerprints {
    fn from(encoders: &EncoderSet) -> Self {
        let [gender, diagnosis, procedure] = encoders.fingerprints();
        Self {
            gender,
            diagnosis,
            procedure,
        }
    }
}

/// Serialized classifier plus the identity of its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub encodings: EncodingFingerprints,
    pub forest: RandomForest,
}

/// A trained forest and its matched encoder triple
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBundle {
    artifact: ClassifierArtifact,
    encoders: EncoderSet,
}

impl ModelBundle {
    /// Pair a freshly trained forest with the encoders it was fitted against
    #[must_use]
    pub fn new(forest: RandomForest, encoders: EncoderSet) -> Self {
        Self {
            artifact: ClassifierArtifact {
                format_version: BUNDLE_FORMAT_VERSION,
                trained_at: Utc::now(),
                feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
                encodings: EncodingFingerprints::from(&encoders),
                forest,
            },
            encoders,
        }
    }

    /// Assemble a bundle from separately loaded parts, verifying they match
    pub fn from_parts(artifact: ClassifierArtifact, encoders: EncoderSet) -> Result<Self> {
        let bundle = Self { artifact, encoders };
        bundle.verify()?;
        Ok(bundle)
    }

    /// Check format version, feature layout and encoding identities
    pub fn verify(&self) -> Result<()> {
        let artifact = &self.artifact;
        if artifact.format_version != BUNDLE_FORMAT_VERSION {
            return Err(RiskError::EncoderModelMismatch(format!(
                "unsupported bundle format version {} (expected {BUNDLE_FORMAT_VERSION})",
                artifact.format_version
            )));
        }
        if !artifact
            .feature_names
            .iter()
            .map(String::as_str)
            .eq(FEATURE_NAMES)
        {
            return Err(RiskError::EncoderModelMismatch(format!(
                "classifier features {:?} do not match {:?}",
                artifact.feature_names, FEATURE_NAMES
            )));
        }

        let slots: [(&Encoding, &str, &str); 3] = [
            (&self.encoders.gender, GENDER_FIELD, &artifact.encodings.gender),
            (&self.encoders.diagnosis, DIAGNOSIS_FIELD, &artifact.encodings.diagnosis),
            (&self.encoders.procedure, PROCEDURE_FIELD, &artifact.encodings.procedure),
        ];
        for (encoding, expected_field, expected_fingerprint) in slots {
            if encoding.field() != expected_field {
                return Err(RiskError::EncoderModelMismatch(format!(
                    "{expected_field} slot holds an encoding for {}",
                    encoding.field()
                )));
            }
            if encoding.fingerprint() != expected_fingerprint {
                return Err(RiskError::EncoderModelMismatch(format!(
                    "{expected_field} encoding does not match the one the classifier was trained with"
                )));
            }
        }
        Ok(())
    }

    /// Write the four bundle files into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<()> {
        let start = Instant::now();
        log_file_operation_start("Saving model bundle to", dir);

        std::fs::create_dir_all(dir)?;
        write_json(&dir.join(CLASSIFIER_FILE), &self.artifact)?;
        write_json(&dir.join(GENDER_ENCODING_FILE), &self.encoders.gender)?;
        write_json(&dir.join(DIAGNOSIS_ENCODING_FILE), &self.encoders.diagnosis)?;
        write_json(&dir.join(PROCEDURE_ENCODING_FILE), &self.encoders.procedure)?;

        log_file_operation_complete("saved", dir, 4, Some(start.elapsed()));
        Ok(())
    }

    /// Load and verify a bundle; fails unless all four files are present and matched
    pub fn load(dir: &Path) -> Result<Self> {
        let start = Instant::now();
        log_file_operation_start("Loading model bundle from", dir);

        for file in [
            CLASSIFIER_FILE,
            GENDER_ENCODING_FILE,
            DIAGNOSIS_ENCODING_FILE,
            PROCEDURE_ENCODING_FILE,
        ] {
            if !dir.join(file).is_file() {
                return Err(RiskError::EncoderModelMismatch(format!(
                    "bundle {} is missing {file}",
                    dir.display()
                )));
            }
        }

        let artifact: ClassifierArtifact = read_json(&dir.join(CLASSIFIER_FILE))?;
        let encoders = EncoderSet {
            gender: read_json(&dir.join(GENDER_ENCODING_FILE))?,
            diagnosis: read_json(&dir.join(DIAGNOSIS_ENCODING_FILE))?,
            procedure: read_json(&dir.join(PROCEDURE_ENCODING_FILE))?,
        };
        let bundle = Self::from_parts(artifact, encoders)?;

        log_file_operation_complete("loaded", dir, 4, Some(start.elapsed()));
        Ok(bundle)
    }

    /// Encode a claim row with the bundle's encoders
    pub fn encode_row(&self, row: &ClaimFeatureRow) -> Result<FeatureVector> {
        self.encoders.encode_row(row)
    }

    /// Predicted risk class of a claim row
    pub fn predict(&self, row: &ClaimFeatureRow) -> Result<RiskClass> {
        Ok(self.artifact.forest.predict(&self.encode_row(row)?))
    }

    /// Class probabilities of a claim row
    pub fn predict_proba(&self, row: &ClaimFeatureRow) -> Result<ClassDistribution> {
        Ok(self.artifact.forest.predict_proba(&self.encode_row(row)?))
    }

    #[must_use]
    pub const fn artifact(&self) -> &ClassifierArtifact {
        &self.artifact
    }

    #[must_use]
    pub const fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    #[must_use]
    pub const fn forest(&self) -> &RandomForest {
        &self.artifact.forest
    }

    #[must_use]
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.artifact.trained_at
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

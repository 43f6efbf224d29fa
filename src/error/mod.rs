//! Error handling for the claim risk pipeline.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for claim normalization, scoring and classification
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing a CSV table
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error processing Arrow arrays
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error converting between Arrow batches and Rust records
    #[error("Arrow conversion error: {0}")]
    SerdeArrow(#[from] serde_arrow::Error),

    /// Error (de)serializing a JSON artifact
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A claim lacks a mandatory identifier
    #[error("Claim row {row} is missing {field}")]
    MissingIdentifier {
        /// Zero-based index of the raw row
        row: usize,
        /// Name of the missing column
        field: &'static str,
    },

    /// A label was presented to an encoding that never saw it during fit
    #[error("Unknown {field} label '{label}'")]
    UnknownCategoricalLabel {
        /// Encoded field name
        field: String,
        /// Offending label
        label: String,
    },

    /// An integer code outside the fitted range was presented for decoding
    #[error("Unknown {field} code {code}")]
    UnknownCategoricalCode {
        /// Encoded field name
        field: String,
        /// Offending code
        code: u32,
    },

    /// Classifier and encoders do not belong to the same training run
    #[error("Encoder/model mismatch: {0}")]
    EncoderModelMismatch(String),

    /// A record cannot be projected onto the classifier's feature vector
    #[error("Member {member_id} is missing feature {field}")]
    MissingFeature {
        /// Member the record belongs to
        member_id: String,
        /// Name of the missing feature
        field: &'static str,
    },

    /// Operation not valid in the service's current lifecycle state
    #[error("Invalid classifier state: {0}")]
    InvalidState(String),

    /// Not enough labelled rows to fit or validate a classifier
    #[error("Insufficient training data: {0}")]
    InsufficientTrainingData(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for claim risk operations
pub type Result<T> = std::result::Result<T, RiskError>;

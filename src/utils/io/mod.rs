//! IO utilities for claim tables and summary output
//!
//! Formats are chosen by file extension: `.csv` or `.parquet`.

pub mod csv;
pub mod parquet;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::models::claim::RawClaim;

/// Supported table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("parquet" | "pq") => Ok(Self::Parquet),
            _ => Err(RiskError::Config(format!(
                "unsupported table format: {} (expected .csv or .parquet)",
                path.display()
            ))),
        }
    }
}

/// Read a claim table in the format implied by its extension
pub fn read_claims(path: &Path) -> Result<Vec<RawClaim>> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => csv::read_claims_csv(path),
        TableFormat::Parquet => parquet::read_claims_parquet(path),
    }
}

/// Write rows in the format implied by the path's extension
pub fn write_table<T>(path: &Path, rows: &[T]) -> Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    match TableFormat::from_path(path)? {
        TableFormat::Csv => csv::write_csv(path, rows),
        TableFormat::Parquet => parquet::write_parquet(path, rows),
    }
}

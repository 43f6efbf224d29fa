//! CSV claim tables and summary output

use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::error::Result;
use crate::models::claim::RawClaim;
use crate::utils::logging::{log_file_operation_complete, log_file_operation_start};

/// Read a claim table with a header row into raw claims
///
/// Cells are trimmed; empty cells and unparsable numbers become `None`, and
/// columns absent from the header are treated as entirely missing.
pub fn read_claims_csv(path: &Path) -> Result<Vec<RawClaim>> {
    let start = Instant::now();
    log_file_operation_start("Reading claim table", path);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let claims = reader
        .deserialize::<RawClaim>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    log_file_operation_complete("read", path, claims.len(), Some(start.elapsed()));
    Ok(claims)
}

/// Write any serializable rows as CSV with a header row
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let start = Instant::now();
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    log_file_operation_complete("wrote", path, rows.len(), Some(start.elapsed()));
    Ok(())
}

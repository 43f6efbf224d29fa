//! Parquet claim tables and summary output
//!
//! Claim columns are projected by name and cast to the types `RawClaim`
//! expects before `serde_arrow` deserializes each batch, so integer member
//! identifiers or string-typed amounts in the source file still load.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, new_null_array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use parquet::arrow::ArrowWriter;
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::models::claim::RawClaim;
use crate::utils::logging::{
    log_file_operation_complete, log_file_operation_start, log_warning,
};

/// Claim table columns and the Arrow type each is read as
pub const CLAIM_COLUMNS: [(&str, DataType); 7] = [
    ("MemberID", DataType::Utf8),
    ("ClaimID", DataType::Utf8),
    ("Age", DataType::Float64),
    ("Gender", DataType::Utf8),
    ("DiagnosisCode", DataType::Utf8),
    ("ProcedureCode", DataType::Utf8),
    ("AmountBilled", DataType::Float64),
];

/// Target schema of a conformed claim batch
#[must_use]
pub fn claim_schema() -> Schema {
    Schema::new(
        CLAIM_COLUMNS
            .iter()
            .map(|(name, data_type)| Field::new(*name, data_type.clone(), true))
            .collect_vec(),
    )
}

/// Cast a batch onto [`claim_schema`], filling absent columns with nulls
pub fn conform_claim_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let source = batch.schema();
    let columns: Vec<ArrayRef> = CLAIM_COLUMNS
        .iter()
        .map(|(name, data_type)| -> Result<ArrayRef> {
            match source.index_of(name) {
                Ok(idx) => Ok(cast(batch.column(idx), data_type)?),
                Err(_) => Ok(new_null_array(data_type, batch.num_rows())),
            }
        })
        .collect::<Result<_>>()?;
    Ok(RecordBatch::try_new(Arc::new(claim_schema()), columns)?)
}

/// Read a Parquet claim table into raw claims
pub fn read_claims_parquet(path: &Path) -> Result<Vec<RawClaim>> {
    let start = Instant::now();
    log_file_operation_start("Reading claim table", path);

    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    let file_schema = builder.schema().clone();
    let projection = CLAIM_COLUMNS
        .iter()
        .filter_map(|(name, _)| {
            file_schema.index_of(name).map_or_else(
                |_| {
                    log_warning(&format!("Column {name} not found in claim table"), Some(path));
                    None
                },
                Some,
            )
        })
        .collect_vec();
    let mask = ProjectionMask::roots(builder.parquet_schema(), projection);
    let reader = builder.with_projection(mask).build()?;

    let mut claims = Vec::new();
    for batch in reader {
        let batch = conform_claim_batch(&batch?)?;
        let rows: Vec<RawClaim> = serde_arrow::from_record_batch(&batch)?;
        claims.extend(rows);
    }

    log_file_operation_complete("read", path, claims.len(), Some(start.elapsed()));
    Ok(claims)
}

/// Write rows as a single-batch Parquet file, schema traced from the row type
pub fn write_parquet<T>(path: &Path, rows: &[T]) -> Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let start = Instant::now();
    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())?;
    let batch = serde_arrow::to_record_batch(&fields, &rows)?;

    let mut writer = ArrowWriter::try_new(File::create(path)?, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    log_file_operation_complete("wrote", path, rows.len(), Some(start.elapsed()));
    Ok(())
}

//! Claim normalization
//!
//! Raw claim rows may bill several diagnoses and procedures on one line as
//! delimiter-separated lists. Normalization explodes each row into the
//! Cartesian product of its diagnosis and procedure codes, diagnosis-major,
//! and drops rows that lack a member or a diagnosis.

use std::time::Instant;

use log::{debug, warn};
use smallvec::SmallVec;

use crate::error::{Result, RiskError};
use crate::models::claim::{ClaimRecord, RawClaim};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Column name reported when a row has no member identifier
pub const MEMBER_ID_FIELD: &str = "MemberID";
/// Column name reported when a row has no diagnosis code
pub const DIAGNOSIS_FIELD: &str = "DiagnosisCode";

/// Counts describing one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Raw rows presented
    pub input_rows: usize,
    /// Normalized records produced
    pub output_rows: usize,
    /// Rows dropped for a missing member identifier
    pub missing_member_id: usize,
    /// Rows dropped for a missing diagnosis code
    pub missing_diagnosis: usize,
}

impl NormalizationReport {
    /// Total rows dropped
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.missing_member_id + self.missing_diagnosis
    }
}

/// Output of a normalization pass
#[derive(Debug, Clone, Default)]
pub struct NormalizedClaims {
    /// Normalized records in input order, diagnosis-major within a row
    pub records: Vec<ClaimRecord>,
    /// Drop counts
    pub report: NormalizationReport,
}

/// Splits multi-valued code fields and drops rows missing mandatory identifiers
#[derive(Debug, Clone, Copy)]
pub struct ClaimNormalizer {
    delimiter: char,
}

impl Default for ClaimNormalizer {
    fn default() -> Self {
        Self::new(';')
    }
}

impl ClaimNormalizer {
    /// Create a normalizer splitting code lists on `delimiter`
    #[must_use]
    pub const fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Normalize a full claim table
    #[must_use]
    pub fn normalize(&self, rows: &[RawClaim]) -> NormalizedClaims {
        let start = Instant::now();
        log_operation_start("Normalizing claim rows", rows.len());

        let mut report = NormalizationReport {
            input_rows: rows.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(rows.len());

        for (row_idx, row) in rows.iter().enumerate() {
            match self.expand_row(row_idx, row) {
                Ok(expanded) => records.extend(expanded),
                Err(RiskError::MissingIdentifier { row, field }) => {
                    debug!("Dropping claim row {row}: missing {field}");
                    if field == MEMBER_ID_FIELD {
                        report.missing_member_id += 1;
                    } else {
                        report.missing_diagnosis += 1;
                    }
                }
                Err(e) => warn!("Dropping claim row {row_idx}: {e}"),
            }
        }

        report.output_rows = records.len();
        if report.dropped() > 0 {
            warn!(
                "Dropped {} claim rows ({} without {}, {} without {})",
                report.dropped(),
                report.missing_member_id,
                MEMBER_ID_FIELD,
                report.missing_diagnosis,
                DIAGNOSIS_FIELD
            );
        }
        log_operation_complete("normalized", records.len(), Some(start.elapsed()));

        NormalizedClaims { records, report }
    }

    /// Expand one raw row into `diagnoses x procedures` records, diagnosis-major
    pub fn expand_row(&self, row_idx: usize, row: &RawClaim) -> Result<Vec<ClaimRecord>> {
        let member_id = row
            .member_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(RiskError::MissingIdentifier {
                row: row_idx,
                field: MEMBER_ID_FIELD,
            })?;

        let diagnoses = self.split_codes(row.diagnosis_code.as_deref());
        if diagnoses.is_empty() {
            return Err(RiskError::MissingIdentifier {
                row: row_idx,
                field: DIAGNOSIS_FIELD,
            });
        }

        let procedures = self.split_codes(row.procedure_code.as_deref());
        let procedures: SmallVec<[Option<&str>; 4]> = if procedures.is_empty() {
            SmallVec::from_elem(None, 1)
        } else {
            procedures.into_iter().map(Some).collect()
        };

        let claim_id = row
            .claim_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("row-{row_idx}"), str::to_string);

        let mut records = Vec::with_capacity(diagnoses.len() * procedures.len());
        for diagnosis in &diagnoses {
            for procedure in &procedures {
                records.push(ClaimRecord {
                    member_id: member_id.to_string(),
                    claim_id: claim_id.clone(),
                    age: row.age,
                    gender: row.gender.clone(),
                    diagnosis_code: (*diagnosis).to_string(),
                    procedure_code: procedure.map(str::to_string),
                    amount_billed: row.amount_billed,
                });
            }
        }

        Ok(records)
    }

    /// Split a code field into trimmed, non-empty codes
    fn split_codes<'a>(&self, field: Option<&'a str>) -> SmallVec<[&'a str; 4]> {
        field
            .map(|value| {
                value
                    .split(self.delimiter)
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

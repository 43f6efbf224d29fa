//! Tests for claim normalization

use claim_risk::{ClaimNormalizer, RawClaim};

use crate::utils::claim;

#[test]
fn test_expansion_is_diagnosis_major() {
    let rows = vec![claim("M1", "C1", "E11;I10", "P1;P2")];
    let normalized = ClaimNormalizer::default().normalize(&rows);

    let pairs: Vec<(&str, Option<&str>)> = normalized
        .records
        .iter()
        .map(|r| (r.diagnosis_code.as_str(), r.procedure_code.as_deref()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("E11", Some("P1")),
            ("E11", Some("P2")),
            ("I10", Some("P1")),
            ("I10", Some("P2")),
        ]
    );

    // Other fields are carried unchanged
    for record in &normalized.records {
        assert_eq!(record.member_id, "M1");
        assert_eq!(record.claim_id, "C1");
        assert_eq!(record.age, Some(50.0));
        assert_eq!(record.amount_billed, Some(120.0));
    }
    assert_eq!(normalized.report.output_rows, 4);
}

#[test]
fn test_rows_missing_identifiers_are_dropped_and_counted() {
    let mut no_member = claim("", "C2", "E11", "P1");
    no_member.member_id = Some("   ".to_string());
    let mut no_diagnosis = claim("M3", "C3", "", "P1");
    no_diagnosis.diagnosis_code = None;
    let blank_diagnosis = claim("M4", "C4", " ; ", "P1");

    let rows = vec![
        claim("M1", "C1", "E11", "P1"),
        no_member,
        no_diagnosis,
        blank_diagnosis,
    ];
    let normalized = ClaimNormalizer::default().normalize(&rows);

    assert_eq!(normalized.records.len(), 1);
    assert_eq!(normalized.report.input_rows, 4);
    assert_eq!(normalized.report.missing_member_id, 1);
    assert_eq!(normalized.report.missing_diagnosis, 2);
    assert_eq!(normalized.report.dropped(), 3);
}

#[test]
fn test_missing_procedure_keeps_row() {
    let row = RawClaim {
        procedure_code: None,
        ..claim("M1", "C1", "J45;I10", "")
    };
    let normalized = ClaimNormalizer::default().normalize(&[row]);
    assert_eq!(normalized.records.len(), 2);
    assert!(normalized.records.iter().all(|r| r.procedure_code.is_none()));
}

#[test]
fn test_custom_delimiter() {
    let rows = vec![claim("M1", "C1", "E11|I10", "P1")];
    let normalized = ClaimNormalizer::new('|').normalize(&rows);
    assert_eq!(normalized.records.len(), 2);
    assert_eq!(normalized.records[1].diagnosis_code, "I10");
}

#[test]
fn test_normalization_is_deterministic() {
    let rows = crate::utils::synthetic_claims(40);
    let normalizer = ClaimNormalizer::default();
    assert_eq!(
        normalizer.normalize(&rows).records,
        normalizer.normalize(&rows).records
    );
}

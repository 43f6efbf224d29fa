//! Tests for categorical encodings

use claim_risk::algorithm::classifier::encoding::{FEATURE_COUNT, normalize_gender};
use claim_risk::{ClaimFeatureRow, EncoderSet, Encoding, RiskError};

fn row(gender: Option<&str>, diagnosis: &str, procedure: Option<&str>) -> ClaimFeatureRow {
    ClaimFeatureRow {
        member_id: "M1".to_string(),
        claim_id: "C1".to_string(),
        age: Some(42.0),
        gender: gender.map(str::to_string),
        num_claims: 2,
        unique_diseases: 2,
        avg_criticality: 3.5,
        max_criticality: 4,
        chronic_count: 1,
        diagnosis_code: diagnosis.to_string(),
        procedure_code: procedure.map(str::to_string),
        amount_billed: Some(250.0),
    }
}

#[test]
fn test_decode_inverts_encode() {
    let labels = ["E11", "I10", "J45", "E11", "C50"];
    let encoding = Encoding::fit("DiagnosisCode", labels);
    assert_eq!(encoding.len(), 4);
    for label in labels {
        let code = encoding.encode(label).unwrap();
        assert_eq!(encoding.decode(code).unwrap(), label);
    }
}

#[test]
fn test_fit_is_stable() {
    let labels = vec!["P3", "P1", "P2", "P1"];
    assert_eq!(
        Encoding::fit("ProcedureCode", &labels),
        Encoding::fit("ProcedureCode", &labels)
    );
}

#[test]
fn test_unseen_label_fails() {
    let encoding = Encoding::fit("Gender", ["F", "M"]);
    match encoding.encode("X") {
        Err(RiskError::UnknownCategoricalLabel { field, label }) => {
            assert_eq!(field, "Gender");
            assert_eq!(label, "X");
        }
        other => panic!("expected UnknownCategoricalLabel, got {other:?}"),
    }
    assert!(matches!(
        encoding.decode(7),
        Err(RiskError::UnknownCategoricalCode { code: 7, .. })
    ));
}

#[test]
fn test_encoder_set_projects_rows() {
    let rows = vec![
        row(Some("Female"), "E11", Some("P1")),
        row(Some("M"), "I10", Some("P2")),
    ];
    let encoders = EncoderSet::fit(&rows);
    assert_eq!(encoders.gender.labels(), &["F", "M"]);

    let vector = encoders.encode_row(&rows[1]).unwrap();
    assert_eq!(vector.len(), FEATURE_COUNT);
    assert_eq!(vector[0], 42.0);
    assert_eq!(vector[1], 1.0);
    assert_eq!(vector[7], 1.0);
    assert_eq!(vector[8], 1.0);
    assert_eq!(vector[9], 250.0);

    // Gender spelled differently still maps to the fitted label
    assert_eq!(normalize_gender("female"), "F");
    assert!(encoders.encode_row(&row(Some("female"), "E11", Some("P1"))).is_ok());
}

#[test]
fn test_encode_row_rejects_unseen_and_missing_values() {
    let encoders = EncoderSet::fit(&[row(Some("F"), "E11", Some("P1"))]);

    assert!(matches!(
        encoders.encode_row(&row(Some("F"), "J45", Some("P1"))),
        Err(RiskError::UnknownCategoricalLabel { .. })
    ));
    assert!(matches!(
        encoders.encode_row(&row(Some("F"), "E11", None)),
        Err(RiskError::MissingFeature { field: "ProcedureCode", .. })
    ));
    assert!(matches!(
        encoders.encode_row(&row(None, "E11", Some("P1"))),
        Err(RiskError::MissingFeature { field: "Gender", .. })
    ));
}

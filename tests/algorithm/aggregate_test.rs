//! Tests for per-patient feature aggregation

use claim_risk::{ClaimNormalizer, DiseaseCatalog, FeatureAggregator};

use crate::utils::{by_member, claim, synthetic_claims};

#[test]
fn test_two_disease_patient() {
    let catalog = DiseaseCatalog::standard();
    let rows = vec![claim("M1", "C1", "E11", "P1"), claim("M1", "C2", "I10", "P2")];
    let normalized = ClaimNormalizer::default().normalize(&rows);
    let aggregated = FeatureAggregator::new(&catalog).aggregate(&normalized.records);

    assert_eq!(aggregated.records.len(), 1);
    let record = &aggregated.records[0];
    assert_eq!(record.num_claims, 2);
    assert_eq!(record.unique_diseases, 2);
    assert_eq!(record.max_criticality, 4);
    assert!((record.avg_criticality - 3.5).abs() < 1e-9);
    assert_eq!(record.chronic_count, 1);
    assert_eq!(record.diseases, vec!["Type 2 Diabetes", "Hypertension"]);
    assert_eq!(
        record.preventive_care_advice,
        "Weight management, avoid sugar, regular A1C tests; Reduce salt, regular BP check, avoid stress"
    );
}

#[test]
fn test_unknown_codes_are_excluded_not_zeroed() {
    let catalog = DiseaseCatalog::standard();
    let rows = vec![
        claim("M1", "C1", "E11", "P1"),
        claim("M1", "C2", "X99", "P1"),
        claim("M2", "C3", "X99;U07", "P1"),
    ];
    let normalized = ClaimNormalizer::default().normalize(&rows);
    let aggregated = FeatureAggregator::new(&catalog).aggregate(&normalized.records);

    let records = by_member(&aggregated.records);
    assert_eq!(records.len(), 1);
    let m1 = &records["M1"];
    assert_eq!(m1.num_claims, 1);
    assert!((m1.avg_criticality - 4.0).abs() < 1e-9);
    assert!(!records.contains_key("M2"));

    assert_eq!(aggregated.report.members_seen, 2);
    assert_eq!(aggregated.report.members_profiled, 1);
    assert_eq!(aggregated.report.excluded_claims, 3);
}

#[test]
fn test_repeated_disease_counts_once() {
    let catalog = DiseaseCatalog::standard();
    let rows = vec![
        claim("M1", "C1", "E11", "P1"),
        claim("M1", "C2", "E11.9", "P1"),
        claim("M1", "C3", "E11", "P1"),
    ];
    let normalized = ClaimNormalizer::default().normalize(&rows);
    let record = &FeatureAggregator::new(&catalog)
        .aggregate(&normalized.records)
        .records[0];
    assert_eq!(record.num_claims, 3);
    assert_eq!(record.unique_diseases, 1);
    assert_eq!(record.chronic_count, 1);
}

#[test]
fn test_demographics_come_from_first_catalogued_row() {
    let catalog = DiseaseCatalog::standard();
    let mut first = claim("M1", "C1", "E11", "P1");
    first.age = Some(61.0);
    first.gender = Some("M".to_string());
    let rows = vec![first, claim("M1", "C2", "I10", "P1")];
    let normalized = ClaimNormalizer::default().normalize(&rows);
    let record = &FeatureAggregator::new(&catalog)
        .aggregate(&normalized.records)
        .records[0];
    assert_eq!(record.age, Some(61.0));
    assert_eq!(record.gender.as_deref(), Some("M"));
}

#[test]
fn test_count_invariants_hold() {
    let catalog = DiseaseCatalog::standard();
    let mut rows = synthetic_claims(120);
    // Multi-diagnosis claims with several procedures
    rows.push(claim("MX", "CX1", "E11;I10;J45", "P1;P2;P3"));
    rows.push(claim("MX", "CX2", "E11;C50", "P1"));

    let normalized = ClaimNormalizer::default().normalize(&rows);
    let aggregated = FeatureAggregator::new(&catalog).aggregate(&normalized.records);

    for record in &aggregated.records {
        assert!(record.num_claims >= 1);
        assert!(record.chronic_count <= record.unique_diseases, "{record:?}");
        assert!(record.unique_diseases <= record.num_claims, "{record:?}");
        assert!((1..=5).contains(&record.max_criticality));
        assert!(record.avg_criticality <= f64::from(record.max_criticality) + 1e-9);
    }

    let mx = &by_member(&aggregated.records)["MX"];
    assert_eq!(mx.num_claims, 5);
    assert_eq!(mx.unique_diseases, 4);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let catalog = DiseaseCatalog::standard();
    let normalized = ClaimNormalizer::default().normalize(&synthetic_claims(200));

    let parallel = FeatureAggregator::new(&catalog)
        .with_parallel(true)
        .aggregate(&normalized.records);
    let sequential = FeatureAggregator::new(&catalog)
        .with_parallel(false)
        .aggregate(&normalized.records);

    assert_eq!(by_member(&parallel.records), by_member(&sequential.records));
    assert_eq!(parallel.report, sequential.report);
}

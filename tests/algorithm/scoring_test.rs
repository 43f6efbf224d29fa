//! Tests for the rule-based scorer

use claim_risk::{
    ClaimNormalizer, DiseaseCatalog, FeatureAggregator, PatientFeatureRecord, Recommendation,
    RiskClass, RuleBasedScorer, ScoringConfig,
};

use crate::utils::{claim, synthetic_claims};

fn record(max: u8, avg: f64, unique: u32, chronic: u32, claims: u32) -> PatientFeatureRecord {
    PatientFeatureRecord {
        member_id: "M1".to_string(),
        age: Some(50.0),
        gender: Some("F".to_string()),
        num_claims: claims,
        unique_diseases: unique,
        avg_criticality: avg,
        max_criticality: max,
        chronic_count: chronic,
        preventive_care_advice: String::new(),
        diseases: Vec::new(),
        risk_score: None,
    }
}

#[test]
fn test_end_to_end_two_disease_score() {
    let catalog = DiseaseCatalog::standard();
    let rows = vec![claim("M1", "C1", "E11", "P1"), claim("M1", "C2", "I10", "P2")];
    let normalized = ClaimNormalizer::default().normalize(&rows);
    let aggregated = FeatureAggregator::new(&catalog).aggregate(&normalized.records);

    let scorer = RuleBasedScorer::default();
    let features = &aggregated.records[0];
    assert!((scorer.raw_score(features) - 14.4).abs() < 1e-9);
    assert_eq!(scorer.score(features), RiskClass::Moderate);
    assert_eq!(scorer.score(features).as_u8(), 3);
    assert_eq!(
        scorer.score(features).recommendation(),
        Recommendation::MonitorClosely
    );
}

#[test]
fn test_score_is_deterministic() {
    let scorer = RuleBasedScorer::default();
    let features = record(5, 4.2, 3, 2, 7);
    assert_eq!(scorer.score(&features), scorer.score(&features));
    assert_eq!(scorer.raw_score(&features), scorer.raw_score(&features));
}

#[test]
fn test_score_is_monotonic_in_each_input() {
    let scorer = RuleBasedScorer::default();
    let base = record(2, 2.0, 1, 0, 1);

    for max in 1..=5u8 {
        let lower = PatientFeatureRecord { max_criticality: max, ..base.clone() };
        let higher = PatientFeatureRecord { max_criticality: max + 1, ..base.clone() };
        assert!(scorer.score(&higher) >= scorer.score(&lower));
    }
    for step in 0..20u32 {
        let lower = PatientFeatureRecord { num_claims: step, ..base.clone() };
        let higher = PatientFeatureRecord { num_claims: step + 1, ..base.clone() };
        assert!(scorer.raw_score(&higher) >= scorer.raw_score(&lower));

        let lower = PatientFeatureRecord { chronic_count: step, ..base.clone() };
        let higher = PatientFeatureRecord { chronic_count: step + 1, ..base.clone() };
        assert!(scorer.score(&higher) >= scorer.score(&lower));
    }
}

#[test]
fn test_claim_volume_is_capped() {
    let scorer = RuleBasedScorer::default();
    let ten = record(1, 1.0, 1, 0, 10);
    let hundred = record(1, 1.0, 1, 0, 100);
    assert!((scorer.raw_score(&ten) - scorer.raw_score(&hundred)).abs() < 1e-9);
}

#[test]
fn test_custom_weights() {
    let mut config = ScoringConfig::default();
    config.weights.chronic_count = 10.0;
    let scorer = RuleBasedScorer::new(config);
    // 1.5 + 1.2 + 0.8 + 20 + 0.3 = 23.8
    assert_eq!(scorer.score(&record(1, 1.0, 1, 2, 1)), RiskClass::Critical);
}

#[test]
fn test_all_scores_in_range() {
    let catalog = DiseaseCatalog::standard();
    let normalized = ClaimNormalizer::default().normalize(&synthetic_claims(150));
    let mut records = FeatureAggregator::new(&catalog)
        .aggregate(&normalized.records)
        .records;
    RuleBasedScorer::default().score_all(&mut records);

    assert!(!records.is_empty());
    for record in &records {
        let score = record.risk_score.map(RiskClass::as_u8);
        assert!(matches!(score, Some(1..=5)));
    }
}

//! Tests for classifier training, persistence and serving

use std::fs::File;

use claim_risk::algorithm::classifier::bundle::{
    CLASSIFIER_FILE, DIAGNOSIS_ENCODING_FILE, GENDER_ENCODING_FILE, PROCEDURE_ENCODING_FILE,
};
use claim_risk::algorithm::classifier::{fit, train_detached};
use claim_risk::{
    ClaimFeatureRow, ClassifierService, DiseaseCatalog, Encoding, ModelBundle, RiskClass,
    RiskError, RiskPipeline, ServiceState, build_summaries, predict_members,
};

use crate::utils::{claim, small_classifier_config, synthetic_claims, test_pipeline_config};

fn training_data() -> (Vec<ClaimFeatureRow>, Vec<RiskClass>) {
    let catalog = DiseaseCatalog::standard();
    let config = test_pipeline_config();
    RiskPipeline::new(&catalog, &config)
        .run(&synthetic_claims(120))
        .training_set()
}

#[test]
fn test_fit_reports_diagnostics() {
    let (rows, labels) = training_data();
    let (bundle, report) = fit(&small_classifier_config(), &rows, &labels).unwrap();

    assert_eq!(report.input_rows, rows.len());
    assert_eq!(report.dropped_rows, 0);
    let balanced: usize = report.class_counts.iter().sum();
    assert_eq!(report.train_size + report.test_size, balanced);
    for count in report.class_counts {
        assert!(count == 0 || count == 20);
    }
    assert_eq!(report.cv_scores.len(), 3);
    assert!(report.test_accuracy.is_some_and(|a| (0.0..=1.0).contains(&a)));
    let confusion_total: usize = report.confusion_matrix.iter().flatten().sum();
    assert_eq!(confusion_total, report.test_size);
    assert_eq!(bundle.forest().n_trees(), 10);
}

#[test]
fn test_fit_is_reproducible_for_seed() {
    let (rows, labels) = training_data();
    let config = small_classifier_config();
    let (a, report_a) = fit(&config, &rows, &labels).unwrap();
    let (b, report_b) = fit(&config, &rows, &labels).unwrap();
    assert_eq!(a.forest(), b.forest());
    assert_eq!(a.encoders(), b.encoders());
    assert_eq!(report_a, report_b);
}

#[test]
fn test_fit_drops_rows_with_missing_features() {
    let (mut rows, labels) = training_data();
    rows[0].amount_billed = None;
    rows[1].gender = None;
    let (_, report) = fit(&small_classifier_config(), &rows, &labels).unwrap();
    assert_eq!(report.dropped_rows, 2);
}

#[test]
fn test_fit_rejects_empty_input() {
    assert!(matches!(
        fit(&small_classifier_config(), &[], &[]),
        Err(RiskError::InsufficientTrainingData(_))
    ));
}

#[test]
fn test_service_lifecycle() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();
    let mut service = ClassifierService::new(small_classifier_config());

    assert_eq!(service.state(), &ServiceState::Untrained);
    assert!(matches!(
        service.predict(&rows[0]),
        Err(RiskError::InvalidState(_))
    ));
    assert!(service.serve_trained().is_err());

    service.train(&rows, &labels, dir.path()).unwrap();
    assert!(matches!(service.state(), ServiceState::Trained { .. }));
    assert!(matches!(
        service.predict(&rows[0]),
        Err(RiskError::InvalidState(_))
    ));

    service.serve_trained().unwrap();
    assert!(matches!(service.state(), ServiceState::Serving { .. }));

    let class = service.predict(&rows[0]).unwrap();
    assert!((1..=5).contains(&class.as_u8()));
    let proba = service.predict_proba(&rows[0]).unwrap();
    assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    let batch = service.predict_batch(&rows).unwrap();
    assert_eq!(batch.len(), rows.len());
    assert!(batch.iter().all(Result::is_ok));
}

#[test]
fn test_prediction_fails_for_unseen_label() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();
    let mut service = ClassifierService::new(small_classifier_config());
    service.train(&rows, &labels, dir.path()).unwrap();
    service.load(dir.path()).unwrap();

    let mut unseen = rows[0].clone();
    unseen.diagnosis_code = "Q99".to_string();
    assert!(matches!(
        service.predict(&unseen),
        Err(RiskError::UnknownCategoricalLabel { .. })
    ));
}

#[test]
fn test_bundle_round_trip() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();
    let (bundle, _) = fit(&small_classifier_config(), &rows, &labels).unwrap();

    bundle.save(dir.path()).unwrap();

    // Fingerprints are stored as hex SHA-256 digests of the encodings
    let artifact: serde_json::Value =
        serde_json::from_reader(File::open(dir.path().join(CLASSIFIER_FILE)).unwrap()).unwrap();
    assert_eq!(
        artifact["encodings"]["diagnosis"].as_str(),
        Some(bundle.encoders().diagnosis.fingerprint().as_str())
    );
    assert_eq!(artifact["encodings"]["gender"].as_str().map(str::len), Some(64));

    let loaded = ModelBundle::load(dir.path()).unwrap();
    assert_eq!(loaded, bundle);
    for row in rows.iter().take(20) {
        assert_eq!(loaded.predict(row).unwrap(), bundle.predict(row).unwrap());
    }
}

#[test]
fn test_mismatched_encoding_fails_at_load() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();
    let (bundle, _) = fit(&small_classifier_config(), &rows, &labels).unwrap();
    bundle.save(dir.path()).unwrap();

    let foreign = Encoding::fit("DiagnosisCode", ["ZZZ"]);
    serde_json::to_writer(
        File::create(dir.path().join(DIAGNOSIS_ENCODING_FILE)).unwrap(),
        &foreign,
    )
    .unwrap();

    assert!(matches!(
        ModelBundle::load(dir.path()),
        Err(RiskError::EncoderModelMismatch(_))
    ));
}

#[test]
fn test_swapped_encoding_slot_fails_at_load() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();
    let (bundle, _) = fit(&small_classifier_config(), &rows, &labels).unwrap();
    bundle.save(dir.path()).unwrap();

    std::fs::copy(
        dir.path().join(GENDER_ENCODING_FILE),
        dir.path().join(PROCEDURE_ENCODING_FILE),
    )
    .unwrap();

    assert!(matches!(
        ModelBundle::load(dir.path()),
        Err(RiskError::EncoderModelMismatch(_))
    ));
}

#[test]
fn test_incomplete_bundle_fails_at_load() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();
    let (bundle, _) = fit(&small_classifier_config(), &rows, &labels).unwrap();
    bundle.save(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join(GENDER_ENCODING_FILE)).unwrap();

    let mut service = ClassifierService::new(small_classifier_config());
    assert!(matches!(
        service.load(dir.path()),
        Err(RiskError::EncoderModelMismatch(_))
    ));
    assert_eq!(service.state(), &ServiceState::Untrained);
}

#[test]
fn test_predict_members_keeps_highest_class() {
    let catalog = DiseaseCatalog::standard();
    let config = test_pipeline_config();
    let output = RiskPipeline::new(&catalog, &config).run(&synthetic_claims(120));
    let (rows, labels) = output.training_set();

    let dir = tempfile::tempdir().unwrap();
    let mut service = ClassifierService::new(small_classifier_config());
    service.train(&rows, &labels, dir.path()).unwrap();
    service.serve_trained().unwrap();

    let predictions = predict_members(&service, &output).unwrap();
    assert!(predictions.failures.is_empty());
    assert_eq!(predictions.predicted.len(), output.profiles.len());

    for (member, predicted) in &predictions.predicted {
        let highest = rows
            .iter()
            .filter(|row| &row.member_id == member)
            .map(|row| service.predict(row).unwrap())
            .max()
            .unwrap();
        assert_eq!(*predicted, highest);
    }
}

#[tokio::test]
async fn test_detached_training_persists_bundle() {
    let (rows, labels) = training_data();
    let dir = tempfile::tempdir().unwrap();

    let report = train_detached(
        small_classifier_config(),
        rows,
        labels,
        dir.path().to_path_buf(),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(report.train_size > 0);

    let mut service = ClassifierService::new(small_classifier_config());
    service.mark_trained(dir.path());
    service.serve_trained().unwrap();
    assert!(matches!(service.state(), ServiceState::Serving { .. }));
}

#[test]
fn test_unseen_diagnosis_withholds_member_prediction() {
    let catalog = DiseaseCatalog::standard();
    let config = test_pipeline_config();
    let (rows, labels) = training_data();

    let dir = tempfile::tempdir().unwrap();
    let mut service = ClassifierService::new(small_classifier_config());
    service.train(&rows, &labels, dir.path()).unwrap();
    service.serve_trained().unwrap();

    // C34 is catalogued but never occurs in the training claims
    let serving_rows = vec![
        claim("MA", "CA1", "Z00", "P0"),
        claim("MY", "CY1", "C34", "P0"),
        claim("MZ", "CZ1", "Z00", "P0"),
        claim("MZ", "CZ2", "C34", "P0"),
    ];
    let output = RiskPipeline::new(&catalog, &config).run(&serving_rows);
    let predictions = predict_members(&service, &output).unwrap();

    assert_eq!(predictions.failures.len(), 2);
    assert!(predictions.failures.iter().all(|failure| matches!(
        failure.error,
        RiskError::UnknownCategoricalLabel { .. }
    )));
    assert!(predictions.predicted.contains_key("MA"));
    assert!(!predictions.predicted.contains_key("MY"));
    assert!(!predictions.predicted.contains_key("MZ"));
    assert_eq!(predictions.failed_members().len(), 2);

    let summaries = build_summaries(&output, &catalog, Some(&predictions));
    let ma = summaries.iter().find(|s| s.member_id == "MA").unwrap();
    assert!(ma.predicted_risk.is_some());
    assert!(ma.recommendation.is_some());
    assert_eq!(ma.prediction_error, None);

    for member in ["MY", "MZ"] {
        let summary = summaries.iter().find(|s| s.member_id == member).unwrap();
        assert!(summary.risk_score.is_some());
        assert_eq!(summary.predicted_risk, None);
        assert_eq!(summary.recommendation, None);
        let error = summary.prediction_error.as_deref().unwrap();
        assert!(error.contains("C34"), "unexpected error: {error}");
    }
}

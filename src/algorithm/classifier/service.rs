//! Classifier training and serving
//!
//! `fit` turns claim-level feature rows and their rule-based labels into a
//! `ModelBundle`, reporting held-out and cross-validated accuracy along the
//! way. The numbers are diagnostic only; nothing here gates on them.
//!
//! `ClassifierService` wraps the lifecycle of one deployment:
//! untrained, trained (bundle persisted), then serving (bundle loaded and
//! verified). Prediction is only available while serving.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tokio::task::JoinHandle;

use crate::algorithm::classifier::bundle::ModelBundle;
use crate::algorithm::classifier::encoding::{EncoderSet, FeatureVector};
use crate::algorithm::classifier::forest::{ClassDistribution, ForestParams, RandomForest};
use crate::algorithm::classifier::sampling::{
    balance_classes, stratified_folds, stratified_split,
};
use crate::algorithm::health::scoring::RiskClass;
use crate::config::ClassifierConfig;
use crate::error::{Result, RiskError};
use crate::models::features::ClaimFeatureRow;
use crate::utils::logging::{
    create_main_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
};

/// Per-class confusion counts; rows are true classes, columns predictions
pub type ConfusionMatrix = [[usize; RiskClass::COUNT]; RiskClass::COUNT];

/// Diagnostics from one training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Labelled rows presented
    pub input_rows: usize,
    /// Rows dropped because a feature was missing
    pub dropped_rows: usize,
    /// Rows per class after balancing
    pub class_counts: [usize; RiskClass::COUNT],
    /// Rows the deployed forest was fitted on
    pub train_size: usize,
    /// Held-out rows
    pub test_size: usize,
    /// Accuracy of each cross-validation fold
    pub cv_scores: Vec<f64>,
    /// Mean of `cv_scores`
    pub mean_cv_accuracy: Option<f64>,
    /// Accuracy on the held-out rows
    pub test_accuracy: Option<f64>,
    /// Held-out confusion matrix
    pub confusion_matrix: ConfusionMatrix,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training Report:")?;
        writeln!(
            f,
            "  Rows: {} ({} dropped for missing features)",
            self.input_rows, self.dropped_rows
        )?;
        writeln!(f, "  Class Counts: {:?}", self.class_counts)?;
        writeln!(f, "  Train/Test: {}/{}", self.train_size, self.test_size)?;
        if let Some(mean) = self.mean_cv_accuracy {
            writeln!(
                f,
                "  Cross-Validation Accuracy: {mean:.3} over {} folds",
                self.cv_scores.len()
            )?;
        }
        if let Some(accuracy) = self.test_accuracy {
            writeln!(f, "  Test Accuracy: {accuracy:.3}")?;
        }
        writeln!(f, "  Confusion Matrix (true x predicted):")?;
        for (class, row) in RiskClass::all().iter().zip(&self.confusion_matrix) {
            writeln!(f, "    {class}: {row:?}")?;
        }
        Ok(())
    }
}

/// Fit encoders and a forest on claim rows labelled by the rule-based scorer
pub fn fit(
    config: &ClassifierConfig,
    rows: &[ClaimFeatureRow],
    labels: &[RiskClass],
) -> Result<(ModelBundle, TrainingReport)> {
    config.validate()?;
    if rows.len() != labels.len() {
        return Err(RiskError::InsufficientTrainingData(format!(
            "{} training rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }

    let start = Instant::now();
    log_operation_start("Training risk classifier", rows.len());

    let (usable_rows, usable_labels): (Vec<&ClaimFeatureRow>, Vec<RiskClass>) = rows
        .iter()
        .zip(labels)
        .filter(|(row, _)| has_all_features(row))
        .map(|(row, label)| (row, *label))
        .unzip();
    let dropped_rows = rows.len() - usable_rows.len();
    if dropped_rows > 0 {
        warn!("Dropped {dropped_rows} training rows with missing features");
    }
    if usable_rows.is_empty() {
        return Err(RiskError::InsufficientTrainingData(
            "no training row has a complete feature vector".to_string(),
        ));
    }

    let encoders = EncoderSet::fit_rows(usable_rows.iter().copied());
    let encoded: Vec<FeatureVector> = usable_rows
        .iter()
        .map(|row| encoders.encode_row(row))
        .collect::<Result<_>>()?;

    let selected: Vec<usize> = match config.balance_target {
        Some(target) if target > 0 => balance_classes(&usable_labels, target, config.seed),
        _ => (0..encoded.len()).collect(),
    };
    let samples: Vec<FeatureVector> = selected.iter().map(|&i| encoded[i]).collect();
    let targets: Vec<RiskClass> = selected.iter().map(|&i| usable_labels[i]).collect();

    let mut class_counts = [0usize; RiskClass::COUNT];
    for label in &targets {
        class_counts[label.index()] += 1;
    }

    let all_rows: Vec<usize> = (0..samples.len()).collect();
    let (train, test) = stratified_split(&all_rows, &targets, config.test_fraction, config.seed);
    let params = ForestParams::from(config);

    let cv_scores = cross_validate(&samples, &targets, &train, config, &params)?;
    let mean_cv_accuracy = if cv_scores.is_empty() {
        None
    } else {
        Some(cv_scores.iter().sum::<f64>() / cv_scores.len() as f64)
    };

    let (train_samples, train_targets) = subset(&samples, &targets, &train);
    let progress = config
        .show_progress
        .then(|| create_main_progress_bar(params.n_trees as u64, Some("Fitting random forest")));
    let forest = RandomForest::fit(&train_samples, &train_targets, &params, progress.as_ref())?;
    if let Some(pb) = &progress {
        finish_progress_bar(pb, Some("Forest fitted"));
    }

    let (test_accuracy, confusion_matrix) = evaluate(&forest, &samples, &targets, &test);

    let report = TrainingReport {
        input_rows: rows.len(),
        dropped_rows,
        class_counts,
        train_size: train.len(),
        test_size: test.len(),
        cv_scores,
        mean_cv_accuracy,
        test_accuracy,
        confusion_matrix,
    };
    info!("{report}");
    log_operation_complete("trained on", train.len(), Some(start.elapsed()));

    Ok((ModelBundle::new(forest, encoders), report))
}

fn has_all_features(row: &ClaimFeatureRow) -> bool {
    row.age.is_some()
        && row.gender.is_some()
        && row.procedure_code.is_some()
        && row.amount_billed.is_some()
}

fn subset(
    samples: &[FeatureVector],
    targets: &[RiskClass],
    indices: &[usize],
) -> (Vec<FeatureVector>, Vec<RiskClass>) {
    indices.iter().map(|&i| (samples[i], targets[i])).unzip()
}

/// Accuracy and confusion matrix over `indices`; `None` accuracy when empty
fn evaluate(
    forest: &RandomForest,
    samples: &[FeatureVector],
    targets: &[RiskClass],
    indices: &[usize],
) -> (Option<f64>, ConfusionMatrix) {
    let mut confusion = [[0usize; RiskClass::COUNT]; RiskClass::COUNT];
    if indices.is_empty() {
        return (None, confusion);
    }

    let mut correct = 0usize;
    for &i in indices {
        let predicted = forest.predict(&samples[i]);
        confusion[targets[i].index()][predicted.index()] += 1;
        if predicted == targets[i] {
            correct += 1;
        }
    }
    (Some(correct as f64 / indices.len() as f64), confusion)
}

fn cross_validate(
    samples: &[FeatureVector],
    targets: &[RiskClass],
    train: &[usize],
    config: &ClassifierConfig,
    params: &ForestParams,
) -> Result<Vec<f64>> {
    if config.cv_folds < 2 || train.len() < config.cv_folds {
        return Ok(Vec::new());
    }

    let folds = stratified_folds(train, targets, config.cv_folds, config.seed);
    let mut scores = Vec::with_capacity(folds.len());
    for fold in &folds {
        let held_out: FxHashSet<usize> = fold.iter().copied().collect();
        let fold_train: Vec<usize> = train
            .iter()
            .copied()
            .filter(|i| !held_out.contains(i))
            .collect();
        if fold.is_empty() || fold_train.is_empty() {
            continue;
        }

        let (fold_samples, fold_targets) = subset(samples, targets, &fold_train);
        let forest = RandomForest::fit(&fold_samples, &fold_targets, params, None)?;
        if let (Some(accuracy), _) = evaluate(&forest, samples, targets, fold) {
            scores.push(accuracy);
        }
    }
    Ok(scores)
}

/// Lifecycle state of a classifier deployment
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceState {
    /// No model available
    Untrained,
    /// A bundle has been trained and persisted but not loaded for serving
    Trained { bundle_dir: PathBuf },
    /// A verified bundle is loaded
    Serving { bundle: ModelBundle },
}

impl ServiceState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Untrained => "untrained",
            Self::Trained { .. } => "trained",
            Self::Serving { .. } => "serving",
        }
    }
}

/// Trains, persists and serves the risk classifier
#[derive(Debug, Clone)]
pub struct ClassifierService {
    config: ClassifierConfig,
    state: ServiceState,
}

impl ClassifierService {
    #[must_use]
    pub const fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            state: ServiceState::Untrained,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> &ServiceState {
        &self.state
    }

    /// Fit a bundle, persist it to `bundle_dir` and move to `Trained`
    pub fn train(
        &mut self,
        rows: &[ClaimFeatureRow],
        labels: &[RiskClass],
        bundle_dir: &Path,
    ) -> Result<TrainingReport> {
        let (bundle, report) = fit(&self.config, rows, labels)?;
        bundle.save(bundle_dir)?;
        self.state = ServiceState::Trained {
            bundle_dir: bundle_dir.to_path_buf(),
        };
        Ok(report)
    }

    /// Record a bundle persisted elsewhere (e.g. by [`train_detached`])
    pub fn mark_trained(&mut self, bundle_dir: &Path) {
        self.state = ServiceState::Trained {
            bundle_dir: bundle_dir.to_path_buf(),
        };
    }

    /// Load and verify a bundle, then start serving it
    pub fn load(&mut self, bundle_dir: &Path) -> Result<()> {
        let bundle = ModelBundle::load(bundle_dir)?;
        info!(
            "Serving classifier trained at {} with {} trees",
            bundle.trained_at(),
            bundle.forest().n_trees()
        );
        self.state = ServiceState::Serving { bundle };
        Ok(())
    }

    /// Start serving the bundle persisted by the last training run
    pub fn serve_trained(&mut self) -> Result<()> {
        match &self.state {
            ServiceState::Trained { bundle_dir } => {
                let bundle_dir = bundle_dir.clone();
                self.load(&bundle_dir)
            }
            other => Err(RiskError::InvalidState(format!(
                "cannot serve from the {} state",
                other.name()
            ))),
        }
    }

    /// The loaded bundle; fails unless serving
    pub fn bundle(&self) -> Result<&ModelBundle> {
        match &self.state {
            ServiceState::Serving { bundle } => Ok(bundle),
            other => Err(RiskError::InvalidState(format!(
                "prediction requires a loaded bundle, service is {}",
                other.name()
            ))),
        }
    }

    /// Predicted risk class of one claim row
    pub fn predict(&self, row: &ClaimFeatureRow) -> Result<RiskClass> {
        self.bundle()?.predict(row)
    }

    /// Class probabilities of one claim row
    pub fn predict_proba(&self, row: &ClaimFeatureRow) -> Result<ClassDistribution> {
        self.bundle()?.predict_proba(row)
    }

    /// Predict every row in parallel; per-row failures stay in their slot
    pub fn predict_batch(&self, rows: &[ClaimFeatureRow]) -> Result<Vec<Result<RiskClass>>> {
        let bundle = self.bundle()?;
        Ok(rows.par_iter().map(|row| bundle.predict(row)).collect())
    }
}

/// Run `fit` and persist the bundle on tokio's blocking pool
///
/// Training cannot be interrupted; a caller that loses interest may drop the
/// handle and ignore the result. Must be called from within a tokio runtime.
pub fn train_detached(
    config: ClassifierConfig,
    rows: Vec<ClaimFeatureRow>,
    labels: Vec<RiskClass>,
    bundle_dir: PathBuf,
) -> JoinHandle<Result<TrainingReport>> {
    tokio::task::spawn_blocking(move || {
        let (bundle, report) = fit(&config, &rows, &labels)?;
        bundle.save(&bundle_dir)?;
        Ok(report)
    })
}

//! Learned risk classifier
//!
//! A random forest trained to reproduce the rule-based risk class from
//! claim-level features, together with the categorical encodings and the
//! persisted bundle that keep the two in step.

pub mod bundle;
pub mod encoding;
pub mod forest;
pub mod sampling;
pub mod service;

pub use bundle::{ClassifierArtifact, ModelBundle};
pub use encoding::{EncoderSet, Encoding, FEATURE_NAMES, FeatureVector};
pub use forest::{ClassDistribution, DecisionTree, ForestParams, RandomForest};
pub use service::{ClassifierService, ServiceState, TrainingReport, fit, train_detached};

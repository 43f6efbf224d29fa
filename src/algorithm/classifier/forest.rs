//! Random forest classifier
//!
//! CART decision trees split on Gini impurity, each fitted on a bootstrap
//! sample with a random feature subset per split. The forest averages the
//! leaf class distributions of its trees.
//!
//! Trees are fitted in parallel with rayon. Each tree draws from its own RNG
//! seeded with `seed + tree index`, so a fitted forest depends only on the data
//! and the seed, never on thread scheduling.

use indicatif::ProgressBar;
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::classifier::encoding::{FEATURE_COUNT, FeatureVector};
use crate::algorithm::health::scoring::RiskClass;
use crate::config::ClassifierConfig;
use crate::error::{Result, RiskError};

/// Per-class probability vector, indexed by [`RiskClass::index`]
pub type ClassDistribution = [f64; RiskClass::COUNT];

/// Hyper-parameters of a fitted forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split a node
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split
    pub max_features: usize,
    /// Base seed
    pub seed: u64,
}

impl From<&ClassifierConfig> for ForestParams {
    fn from(config: &ClassifierConfig) -> Self {
        let default_features = (FEATURE_COUNT as f64).sqrt().floor() as usize;
        Self {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            min_samples_leaf: config.min_samples_leaf.max(1),
            max_features: config
                .max_features
                .unwrap_or(default_features)
                .clamp(1, FEATURE_COUNT),
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: ClassDistribution,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Fit a tree on the rows of `samples` selected by `indices` (repeats allowed)
    #[must_use]
    pub fn fit(
        samples: &[FeatureVector],
        labels: &[RiskClass],
        indices: &[usize],
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            samples,
            labels,
            params,
            nodes: Vec::new(),
        };
        let mut indices = indices.to_vec();
        builder.build(&mut indices, 0, rng);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Class distribution of the leaf `sample` falls into
    #[must_use]
    pub fn predict_proba(&self, sample: &FeatureVector) -> ClassDistribution {
        let mut node_id = 0;
        loop {
            match self.nodes.get(node_id) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    node_id = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Some(Node::Leaf { distribution }) => return *distribution,
                None => return [0.0; RiskClass::COUNT],
            }
        }
    }

    /// Number of nodes in the tree
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

struct TreeBuilder<'a> {
    samples: &'a [FeatureVector],
    labels: &'a [RiskClass],
    params: &'a ForestParams,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let counts = self.class_counts(indices);
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: distribution(&counts, indices.len()),
        });

        let pure = counts.iter().filter(|&&count| count > 0).count() <= 1;
        if pure || depth >= self.params.max_depth || indices.len() < self.params.min_samples_split
        {
            return node_id;
        }

        let Some((feature, threshold)) = self.best_split(indices, &counts, rng) else {
            return node_id;
        };

        let mid = partition(indices, |idx| self.samples[idx][feature] <= threshold);
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.build(left_indices, depth + 1, rng);
        let right = self.build(right_indices, depth + 1, rng);

        self.nodes[node_id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_id
    }

    fn class_counts(&self, indices: &[usize]) -> [usize; RiskClass::COUNT] {
        let mut counts = [0usize; RiskClass::COUNT];
        for &idx in indices {
            counts[self.labels[idx].index()] += 1;
        }
        counts
    }

    /// Lowest weighted-Gini split over a random feature subset, if it improves on the parent
    fn best_split(
        &self,
        indices: &[usize],
        parent_counts: &[usize; RiskClass::COUNT],
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let parent_impurity = gini(parent_counts, n);
        let features = rand::seq::index::sample(rng, FEATURE_COUNT, self.params.max_features);

        let mut order = indices.to_vec();
        let mut best: Option<(f64, usize, f64)> = None;

        for feature in features.iter() {
            order.sort_by(|&a, &b| self.samples[a][feature].total_cmp(&self.samples[b][feature]));

            let mut left_counts = [0usize; RiskClass::COUNT];
            for pos in 0..n - 1 {
                let current = order[pos];
                left_counts[self.labels[current].index()] += 1;

                let value = self.samples[current][feature];
                let next_value = self.samples[order[pos + 1]][feature];
                if next_value <= value {
                    continue;
                }

                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let mut right_counts = [0usize; RiskClass::COUNT];
                for class in 0..RiskClass::COUNT {
                    right_counts[class] = parent_counts[class] - left_counts[class];
                }

                let impurity = (left_n as f64 * gini(&left_counts, left_n)
                    + right_n as f64 * gini(&right_counts, right_n))
                    / n as f64;

                if best.is_none_or(|(best_impurity, _, _)| impurity < best_impurity) {
                    let midpoint = value + (next_value - value) / 2.0;
                    let threshold = if midpoint < next_value { midpoint } else { value };
                    best = Some((impurity, feature, threshold));
                }
            }
        }

        best.filter(|(impurity, _, _)| *impurity < parent_impurity)
            .map(|(_, feature, threshold)| (feature, threshold))
    }
}

fn gini(counts: &[usize; RiskClass::COUNT], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&count| {
            let p = count as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn distribution(counts: &[usize; RiskClass::COUNT], total: usize) -> ClassDistribution {
    let mut dist = [0.0; RiskClass::COUNT];
    if total > 0 {
        for (slot, &count) in dist.iter_mut().zip(counts) {
            *slot = count as f64 / total as f64;
        }
    }
    dist
}

/// Move indices matching `pred` to the front; returns how many matched
fn partition<F: Fn(usize) -> bool>(indices: &mut [usize], pred: F) -> usize {
    let mut mid = 0;
    for i in 0..indices.len() {
        if pred(indices[i]) {
            indices.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest; `progress` is advanced once per fitted tree
    pub fn fit(
        samples: &[FeatureVector],
        labels: &[RiskClass],
        params: &ForestParams,
        progress: Option<&ProgressBar>,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(RiskError::InsufficientTrainingData(
                "cannot fit a forest on zero rows".to_string(),
            ));
        }
        if samples.len() != labels.len() {
            return Err(RiskError::InsufficientTrainingData(format!(
                "{} feature rows but {} labels",
                samples.len(),
                labels.len()
            )));
        }

        let n = samples.len();
        let trees: Vec<DecisionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(tree_idx as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                let tree = DecisionTree::fit(samples, labels, &bootstrap, params, &mut rng);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                tree
            })
            .collect();

        Ok(Self {
            params: *params,
            trees,
        })
    }

    /// Mean class distribution over all trees
    #[must_use]
    pub fn predict_proba(&self, sample: &FeatureVector) -> ClassDistribution {
        let mut total = [0.0; RiskClass::COUNT];
        for tree in &self.trees {
            for (slot, p) in total.iter_mut().zip(tree.predict_proba(sample)) {
                *slot += p;
            }
        }
        if !self.trees.is_empty() {
            let n_trees = self.trees.len() as f64;
            for slot in &mut total {
                *slot /= n_trees;
            }
        }
        total
    }

    /// Most probable class; ties go to the lower class
    #[must_use]
    pub fn predict(&self, sample: &FeatureVector) -> RiskClass {
        let proba = self.predict_proba(sample);
        let mut best = 0;
        for (idx, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = idx;
            }
        }
        RiskClass::from_index(best).unwrap_or(RiskClass::Minimal)
    }

    /// Hyper-parameters the forest was fitted with
    #[must_use]
    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Number of trees
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

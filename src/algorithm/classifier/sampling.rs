//! Seeded resampling of labelled rows
//!
//! Every function returns row indices rather than copying rows, and takes an
//! explicit seed so a training run can be reproduced exactly.

use rand::prelude::*;

use crate::algorithm::health::scoring::RiskClass;

/// Row indices grouped by class, classes ascending, rows in input order
fn indices_by_class(labels: &[RiskClass]) -> [Vec<usize>; RiskClass::COUNT] {
    let mut groups: [Vec<usize>; RiskClass::COUNT] = Default::default();
    for (idx, label) in labels.iter().enumerate() {
        groups[label.index()].push(idx);
    }
    groups
}

/// Resample every present class to exactly `target` rows
///
/// Classes with fewer rows are oversampled with replacement, classes with more
/// are subsampled without replacement. Absent classes stay absent. The
/// combined indices are shuffled.
#[must_use]
pub fn balance_classes(labels: &[RiskClass], target: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut balanced = Vec::with_capacity(target * RiskClass::COUNT);

    for rows in indices_by_class(labels) {
        if rows.is_empty() {
            continue;
        }
        if rows.len() >= target {
            balanced.extend(
                rand::seq::index::sample(&mut rng, rows.len(), target)
                    .iter()
                    .map(|pos| rows[pos]),
            );
        } else {
            balanced.extend((0..target).map(|_| rows[rng.random_range(0..rows.len())]));
        }
    }

    balanced.shuffle(&mut rng);
    balanced
}

/// Class-stratified train/test split of `rows`
///
/// Each class contributes `round(len * test_fraction)` rows to the test side,
/// keeping at least one row on the training side. Returns `(train, test)`.
#[must_use]
pub fn stratified_split(
    rows: &[usize],
    labels: &[RiskClass],
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: [Vec<usize>; RiskClass::COUNT] = Default::default();
    for &row in rows {
        groups[labels[row].index()].push(row);
    }

    let mut train = Vec::with_capacity(rows.len());
    let mut test = Vec::new();
    for mut group in groups {
        if group.is_empty() {
            continue;
        }
        group.shuffle(&mut rng);
        let n_test = ((group.len() as f64 * test_fraction).round() as usize).min(group.len() - 1);
        test.extend_from_slice(&group[..n_test]);
        train.extend_from_slice(&group[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    (train, test)
}

/// Partition `rows` into `k` class-stratified validation folds
///
/// Rows of each class are shuffled and dealt round-robin, continuing from the
/// fold where the previous class stopped so fold sizes differ by at most one.
#[must_use]
pub fn stratified_folds(
    rows: &[usize],
    labels: &[RiskClass],
    k: usize,
    seed: u64,
) -> Vec<Vec<usize>> {
    if k == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: [Vec<usize>; RiskClass::COUNT] = Default::default();
    for &row in rows {
        groups[labels[row].index()].push(row);
    }

    let mut folds = vec![Vec::with_capacity(rows.len() / k + 1); k];
    let mut next_fold = 0;
    for mut group in groups {
        group.shuffle(&mut rng);
        for row in group {
            folds[next_fold].push(row);
            next_fold = (next_fold + 1) % k;
        }
    }
    folds
}

//! Shared fixtures for integration tests.
//!
//! For assertion helpers and synthetic data, use `sparselin::testing`.

#![allow(dead_code)]

use std::collections::BTreeMap;

use sparselin::data::Problem;

#[allow(unused_imports)]
pub use sparselin::testing::{
    accuracy, assert_same_entries, assert_slice_approx_eq, random_sparse, sparse_blobs,
    DEFAULT_TOLERANCE,
};

/// The four-sample problem used across the problem tests.
pub fn four_samples() -> (Vec<i32>, Vec<BTreeMap<i32, f64>>) {
    let samples = vec![
        BTreeMap::from([(2, 0.1), (3, 0.3), (4, -1.2)]),
        BTreeMap::from([(1, 0.4)]),
        BTreeMap::from([(2, 0.1), (4, 1.4), (5, 0.5)]),
        BTreeMap::from([(1, -0.1), (2, -0.2), (3, 0.1), (4, 1.1), (5, 0.1)]),
    ];
    (vec![2, 1, 2, 3], samples)
}

/// Three well separated classes with a bias feature.
pub fn three_class_problem(seed: u64) -> Problem {
    let (labels, samples) = sparse_blobs(&[10, 20, 30], 20, 6, 2, seed);
    Problem::new(&labels, &samples, 1.0, 6).unwrap()
}

/// Two well separated classes with a bias feature, `1` listed first.
pub fn binary_problem(seed: u64) -> Problem {
    let (labels, samples) = sparse_blobs(&[1, -1], 30, 4, 1, seed);
    Problem::new(&labels, &samples, 1.0, 4).unwrap()
}

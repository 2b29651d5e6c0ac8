//! Testing utilities for sparselin.
//!
//! Assertion helpers and synthetic data shared by unit tests, integration
//! tests and benches.
//!
//! ```ignore
//! use sparselin::testing::{assert_slice_approx_eq, sparse_blobs};
//! ```

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Default tolerance for floating point comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Assertions
// =============================================================================

/// Assert that two slices are approximately equal, element by element.
///
/// # Panics
///
/// Panics if lengths differ or any element differs by more than tolerance.
pub fn assert_slice_approx_eq(actual: &[f64], expected: &[f64], tolerance: f64, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}[{i}]: {a} ≠ {e} (diff={diff}, tolerance={tolerance})"
        );
    }
}

/// Assert that two sparse vectors hold the same `(index, value)` pairs,
/// ignoring order.
pub fn assert_same_entries(actual: &[(i32, f64)], expected: &[(i32, f64)], context: &str) {
    let sorted = |pairs: &[(i32, f64)]| {
        let mut pairs = pairs.to_vec();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        pairs
    };
    assert_eq!(sorted(actual), sorted(expected), "{context}: entries differ");
}

/// Fraction of predictions equal to the reference labels.
pub fn accuracy(predicted: &[i32], labels: &[i32]) -> f64 {
    assert_eq!(predicted.len(), labels.len(), "length mismatch");
    if labels.is_empty() {
        return 1.0;
    }
    let hits = predicted.iter().zip(labels).filter(|(p, l)| p == l).count();
    hits as f64 / labels.len() as f64
}

// =============================================================================
// Synthetic data
// =============================================================================

/// Well separated sparse clusters, one per label.
///
/// Class `k` is centred on feature `k + 1` with value `3.0`; every sample
/// also carries uniform noise in `[-0.5, 0.5]` on `noise_features` of the
/// `n_features` features. Returns `(labels, samples)`, interleaved by class.
pub fn sparse_blobs(
    labels: &[i32],
    per_class: usize,
    n_features: i32,
    noise_features: usize,
    seed: u64,
) -> (Vec<i32>, Vec<BTreeMap<i32, f64>>) {
    assert!(n_features as usize >= labels.len(), "need one feature per class");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut ys = Vec::with_capacity(labels.len() * per_class);
    let mut samples = Vec::with_capacity(labels.len() * per_class);

    for _ in 0..per_class {
        for (k, &label) in labels.iter().enumerate() {
            let mut sample = BTreeMap::new();
            for _ in 0..noise_features {
                let index = rng.gen_range(1..=n_features);
                sample.insert(index, rng.gen_range(-0.5..0.5));
            }
            let centre = k as i32 + 1;
            *sample.entry(centre).or_insert(0.0) += 3.0;
            ys.push(label);
            samples.push(sample);
        }
    }
    (ys, samples)
}

/// Random sparse samples with strictly increasing indices.
pub fn random_sparse(
    n_samples: usize,
    n_features: i32,
    density: f64,
    seed: u64,
) -> Vec<Vec<(i32, f64)>> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let mut sample = Vec::new();
        for index in 1..=n_features {
            if rng.gen_bool(density) {
                sample.push((index, rng.gen_range(-1.0..1.0)));
            }
        }
        samples.push(sample);
    }
    samples
}

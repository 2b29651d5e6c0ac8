//! Problem construction from host data.

mod common;

use std::collections::{BTreeMap, HashMap};

use rstest::rstest;
use sparselin::data::{FeatureNode, Problem, ProblemBuilder, SparseSample};
use sparselin::{ErrorKind, LinearError};

use common::{assert_same_entries, four_samples};

fn slice_with_sentinel(problem: &Problem, sample: usize) -> Vec<(i32, f64)> {
    problem
        .arena()
        .unwrap()
        .sample_with_sentinel(sample)
        .unwrap()
        .iter()
        .map(FeatureNode::pair)
        .collect()
}

#[test]
fn two_samples_with_bias() {
    let samples = vec![
        BTreeMap::from([(1, 0.5), (3, 1.0)]),
        BTreeMap::from([(2, -1.0)]),
    ];
    let problem = ProblemBuilder::new(3)
        .bias(1.0)
        .build(&[1, -1], &samples)
        .unwrap();

    assert_eq!(problem.n(), 4);
    assert_eq!(problem.l(), 2);
    assert_eq!(
        slice_with_sentinel(&problem, 0),
        vec![(1, 0.5), (3, 1.0), (4, 1.0), (-1, -1.0)]
    );
    assert_eq!(
        slice_with_sentinel(&problem, 1),
        vec![(2, -1.0), (4, 1.0), (-1, -1.0)]
    );
}

#[rstest]
#[case::disabled(-1.0, 5, 16)]
#[case::zero_is_disabled(0.0, 5, 16)]
#[case::enabled(1.0, 6, 20)]
#[case::fractional(0.5, 6, 20)]
fn n_and_arena_size_follow_bias(#[case] bias: f64, #[case] n: i32, #[case] nodes: usize) {
    let (labels, samples) = four_samples();
    let builder = ProblemBuilder::new(5).bias(bias);
    assert_eq!(builder.required_nodes(&samples), nodes);

    let problem = builder.build(&labels, &samples).unwrap();
    assert_eq!(problem.n(), n);
    assert_eq!(problem.arena().unwrap().total_nodes(), nodes);
    assert_eq!(problem.bias(), bias);
}

#[test]
fn every_sample_holds_its_mapping_plus_bias() {
    let (labels, samples) = four_samples();
    let problem = Problem::new(&labels, &samples, 2.5, 5).unwrap();
    for (i, sample) in samples.iter().enumerate() {
        let mut expected: Vec<(i32, f64)> = sample.iter().map(|(&k, &v)| (k, v)).collect();
        expected.push((6, 2.5));
        assert_same_entries(&problem.feature_vector(i).unwrap(), &expected, "sample");
    }
}

#[test]
fn hashmap_order_is_kept_as_iterated() {
    let sample: HashMap<i32, f64> = (1..=20).map(|i| (i, i as f64)).collect();
    let expected: Vec<(i32, f64)> = sample.iter().map(|(&k, &v)| (k, v)).collect();
    let problem = Problem::new(&[1], &[&sample], -1.0, 20).unwrap();
    assert_eq!(problem.feature_vector(0).unwrap(), expected);
}

#[test]
fn unsorted_pairs_are_not_reordered() {
    let samples = vec![vec![(3, 1.0), (1, 2.0)]];
    let problem = Problem::new(&[1], &samples, -1.0, 3).unwrap();
    assert_eq!(problem.feature_vector(0).unwrap(), vec![(3, 1.0), (1, 2.0)]);
}

#[test]
fn length_mismatch_fails_fast() {
    let (_, samples) = four_samples();
    let err = Problem::new(&[1, 2], &samples, 1.0, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(
        err.to_string(),
        "samples and labels were of different length (4, 2)"
    );
}

#[test]
fn index_beyond_attribute_count_is_rejected() {
    let (labels, samples) = four_samples();
    let err = Problem::new(&labels, &samples, -1.0, 3).unwrap_err();
    assert!(matches!(
        err,
        LinearError::FeatureIndexInvalid { sample: 0, index: 4, max: 3 }
    ));
}

#[test]
fn destroyed_problem_keeps_labels_only() {
    let (labels, samples) = four_samples();
    let mut problem = Problem::new(&labels, &samples, 1.0, 5).unwrap();
    problem.destroy();
    problem.destroy();

    assert!(problem.is_destroyed());
    assert_eq!(problem.labels(), labels.as_slice());
    assert_eq!(problem.l(), 4);
    for err in [
        problem.feature_vector(0).unwrap_err(),
        problem.arena().map(|_| ()).unwrap_err(),
        problem.samples().map(|_| ()).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::ResourceDestroyed);
    }
}

#[test]
fn empty_problem() {
    let samples: Vec<Vec<(i32, f64)>> = Vec::new();
    let problem = Problem::new(&[], &samples, 1.0, 0).unwrap();
    assert_eq!(problem.l(), 0);
    assert_eq!(problem.n(), 1);
    assert_eq!(problem.arena().unwrap().total_nodes(), 0);
}

/// A sample whose reported size disagrees with what it yields.
struct MisreportedSample {
    reported: usize,
    pairs: Vec<(i32, f64)>,
}

impl SparseSample for MisreportedSample {
    fn n_entries(&self) -> usize {
        self.reported
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.pairs.iter().copied()
    }
}

#[rstest]
#[case::under_reported(1, 0.0)]
#[case::under_reported_with_bias(1, 1.0)]
#[case::over_reported(4, 0.0)]
#[case::over_reported_with_bias(4, 1.0)]
fn size_disagreement_is_internal_fault(#[case] reported: usize, #[case] bias: f64) {
    let samples = vec![
        MisreportedSample {
            reported: 2,
            pairs: vec![(1, 1.0), (2, 2.0)],
        },
        MisreportedSample {
            reported,
            pairs: vec![(1, 0.5), (3, 1.5)],
        },
    ];
    let err = ProblemBuilder::new(3)
        .bias(bias)
        .build(&[1, -1], &samples)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalConsistency);
}

//! Sparse text parsing and writing.

mod common;

use std::io::Write;

use sparselin::data::{FeatureNode, Problem, TextFormatParser};
use sparselin::{ErrorKind, LinearError};

use common::{assert_same_entries, four_samples};

#[test]
fn parser_and_builder_agree() {
    let (labels, samples) = four_samples();
    let built = Problem::new(&labels, &samples, 1.0, 5).unwrap();

    let mut text = Vec::new();
    built.write_text(&mut text).unwrap();
    let parsed = TextFormatParser::new()
        .bias(1.0)
        .parse_str(std::str::from_utf8(&text).unwrap())
        .unwrap();

    assert_eq!(parsed.labels(), built.labels());
    assert_eq!(parsed.n(), built.n());
    assert_eq!(
        parsed.arena().unwrap().as_slice(),
        built.arena().unwrap().as_slice()
    );
}

#[test]
fn load_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "+1 1:0.3 2:0.7").unwrap();
    writeln!(file, "-1 3:1.5").unwrap();
    file.flush().unwrap();

    let problem = Problem::load_file(file.path(), -1.0).unwrap();
    assert_eq!(problem.labels(), &[1, -1]);
    assert_eq!(problem.n(), 3);
    let nodes: Vec<_> = problem
        .arena()
        .unwrap()
        .sample_with_sentinel(0)
        .unwrap()
        .iter()
        .map(FeatureNode::pair)
        .collect();
    assert_eq!(nodes, vec![(1, 0.3), (2, 0.7), (-1, -1.0)]);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Problem::load_file(dir.path().join("absent.txt"), 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn non_increasing_line_is_reported() {
    let text = "1 1:1.0 2:1.0\n-1 2:0.5\n1 5:1.0 3:2.0\n-1 1:0.1\n";
    let err = Problem::from_text(text, 1.0).unwrap_err();
    match err {
        LinearError::MalformedInput { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("does not follow"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn failed_parse_leaves_existing_problem_alone() {
    let before = Problem::from_text("1 1:1\n", 1.0).unwrap();
    let snapshot = before.clone();
    assert!(Problem::from_text("1 1:1\n1 2:1 2:3\n", 1.0).is_err());
    assert_eq!(before, snapshot);
}

#[test]
fn discovered_n_tracks_max_index_across_lines() {
    let problem = Problem::from_text("1 2:1\n2 7:1\n3 1:1\n", 1.0).unwrap();
    assert_eq!(problem.n(), 8);
    for i in 0..3 {
        let entries = problem.feature_vector(i).unwrap();
        assert_eq!(entries.last(), Some(&(8, 1.0)));
    }
    assert_same_entries(
        &problem.feature_vector(1).unwrap(),
        &[(7, 1.0), (8, 1.0)],
        "sample 1",
    );
}

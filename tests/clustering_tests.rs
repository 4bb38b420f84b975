mod common;

use common::{keys, plain, store};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::BTreeSet;
use sumac::core::distance_matrix::{DistanceMatrix, INCOMPARABLE_DISTANCE, NO_HIT_DISTANCE};
use sumac::core::Cluster;
use sumac::tools::mock::TableOracle;
use sumac::{DistanceMatrixBuilder, SingleLinkageClusterer, SumacError};

fn example_matrix() -> DistanceMatrix {
    DistanceMatrix::from_rows(vec![
        vec![0.0, 0.0, 5.0, 50.0],
        vec![0.0, 0.0, 5.0, 50.0],
        vec![5.0, 5.0, 0.0, 50.0],
        vec![50.0, 50.0, 50.0, 0.0],
    ])
    .unwrap()
}

fn as_ids(clusters: &[Cluster]) -> Vec<Vec<String>> {
    clusters
        .iter()
        .map(|c| c.iter().map(|k| k.to_string()).collect())
        .collect()
}

fn as_sets(clusters: &[Cluster]) -> BTreeSet<BTreeSet<String>> {
    clusters
        .iter()
        .map(|c| c.iter().map(|k| k.to_string()).collect())
        .collect()
}

#[test]
fn test_example_partition() {
    let outcome = SingleLinkageClusterer::new()
        .cluster(keys(&["A", "B", "C", "D"]), example_matrix(), 1.0)
        .unwrap();

    assert_eq!(
        as_ids(&outcome.clusters),
        vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()], vec!["D".to_string()]]
    );
    assert_eq!(outcome.merge_count(), 1);
}

#[rstest]
#[case(0.0, 3)]
#[case(1.0, 3)]
#[case(5.0, 2)]
#[case(49.9, 2)]
#[case(50.0, 1)]
fn test_example_thresholds(#[case] threshold: f64, #[case] expected_clusters: usize) {
    let outcome = SingleLinkageClusterer::new()
        .cluster(keys(&["A", "B", "C", "D"]), example_matrix(), threshold)
        .unwrap();
    assert_eq!(outcome.clusters.len(), expected_clusters);
}

#[test]
fn test_threshold_below_minimum_gives_singletons() {
    let matrix = DistanceMatrix::from_rows(vec![
        vec![0.0, 2.0, 3.0],
        vec![2.0, 0.0, 4.0],
        vec![3.0, 4.0, 0.0],
    ])
    .unwrap();
    let outcome = SingleLinkageClusterer::new()
        .cluster(keys(&["a", "b", "c"]), matrix, 1.0)
        .unwrap();
    assert_eq!(outcome.clusters.len(), 3);
    assert!(outcome.clusters.iter().all(|c| c.len() == 1));
}

#[test]
fn test_matrix_builder_feeds_clusterer() {
    let store = store(vec![plain("A", 100), plain("B", 100), plain("C", 100), plain("D", 400)]);
    let oracle = TableOracle::new()
        .with_score("A", "B", 0.0)
        .with_score("A", "C", 5.0)
        .with_score("B", "C", 5.0);
    let ids = keys(&["A", "B", "C", "D"]);

    let build = DistanceMatrixBuilder::new(&oracle)
        .with_length_threshold(0.5)
        .build(&ids, &store)
        .unwrap();
    assert_eq!(build.matrix.get(0, 3), INCOMPARABLE_DISTANCE);
    assert_eq!(build.pruned_pairs, 3);
    assert_eq!(oracle.calls(), 3);

    let outcome = SingleLinkageClusterer::new().cluster(ids, build.matrix, 1.0).unwrap();
    assert_eq!(as_ids(&outcome.clusters)[0], vec!["A".to_string(), "B".to_string()]);
    assert_eq!(outcome.clusters.len(), 3);
}

#[test]
fn test_failed_comparisons_are_no_hit() {
    let store = store(vec![plain("a", 100), plain("b", 100), plain("c", 100)]);
    let oracle = TableOracle::new()
        .with_failure("a", "b")
        .with_score("b", "c", 1e-40);

    let build = DistanceMatrixBuilder::new(&oracle)
        .build(&keys(&["a", "b", "c"]), &store)
        .unwrap();
    assert_eq!(build.failed_comparisons, 1);
    assert_eq!(build.matrix.get(1, 0), NO_HIT_DISTANCE);
    assert_eq!(build.oracle_calls, 3);
}

#[test]
fn test_key_count_must_match_matrix() {
    let result = SingleLinkageClusterer::new().cluster(keys(&["A", "B"]), example_matrix(), 1.0);
    assert!(matches!(result, Err(SumacError::Invariant(_))));
}

/// Connected components of the graph joining pairs with distance <= threshold
fn components(matrix: &DistanceMatrix, ids: &[String], threshold: f64) -> BTreeSet<BTreeSet<String>> {
    let n = matrix.size();
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        parent[i] = root;
        root
    }
    for i in 0..n {
        for j in i + 1..n {
            if matrix.get(i, j) <= threshold {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                parent[a] = b;
            }
        }
    }
    let mut groups: std::collections::BTreeMap<usize, BTreeSet<String>> = Default::default();
    for i in 0..n {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().insert(ids[i].clone());
    }
    groups.into_values().collect()
}

fn symmetric_matrix() -> impl Strategy<Value = DistanceMatrix> {
    (1usize..9).prop_flat_map(|n| {
        proptest::collection::vec(prop_oneof![Just(0.0), Just(1e-30), Just(1e-5), Just(10.0), Just(50.0)], n * n)
            .prop_map(move |values| {
                let mut rows = vec![vec![0.0; n]; n];
                for i in 0..n {
                    for j in i + 1..n {
                        rows[i][j] = values[i * n + j];
                        rows[j][i] = values[i * n + j];
                    }
                }
                DistanceMatrix::from_rows(rows).unwrap()
            })
    })
}

proptest! {
    #[test]
    fn prop_single_linkage_partitions_into_components(
        matrix in symmetric_matrix(),
        threshold in prop_oneof![Just(0.0), Just(1e-10), Just(1.0), Just(49.0)],
    ) {
        prop_assert!(matrix.is_symmetric());
        let ids: Vec<String> = (0..matrix.size()).map(|i| format!("k{}", i)).collect();
        let expected = components(&matrix, &ids, threshold);

        let outcome = SingleLinkageClusterer::new()
            .cluster(ids.iter().map(|id| id.as_str().into()).collect(), matrix, threshold)
            .unwrap();

        let total: usize = outcome.clusters.iter().map(Cluster::len).sum();
        prop_assert_eq!(total, ids.len());
        prop_assert_eq!(as_sets(&outcome.clusters), expected);
        prop_assert!(outcome.merges.iter().all(|m| m.distance <= threshold));
    }
}

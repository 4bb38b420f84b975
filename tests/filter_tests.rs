mod common;

use common::{myrtales_store, record, store, LYTHRACEAE};
use pretty_assertions::assert_eq;
use sumac::bio::sequence::SequenceKey;
use sumac::core::{Cluster, DuplicatePolicy};
use sumac::ClusterFilter;

fn cluster(ids: &[&str]) -> Cluster {
    ids.iter().map(|id| SequenceKey::from(*id)).collect()
}

fn retained_ids(filter: &ClusterFilter, clusters: Vec<Cluster>, store: &sumac::storage::MemoryStore) -> Vec<Vec<String>> {
    filter
        .filter(clusters, store)
        .unwrap()
        .retained
        .iter()
        .map(|c| c.keys().map(|k| k.to_string()).collect())
        .collect()
}

#[test]
fn test_three_taxa_discarded() {
    let store = myrtales_store();
    let outcome = ClusterFilter::new()
        .filter(vec![cluster(&["r1", "r2", "r3"])], &store)
        .unwrap();
    assert!(outcome.retained.is_empty());
    assert_eq!(outcome.discarded, vec![cluster(&["r1", "r2", "r3"])]);
}

#[test]
fn test_four_taxa_with_duplicate_retained() {
    let store = myrtales_store();
    // m1 repeats the Lythrum salicaria taxon of r1
    let retained = retained_ids(
        &ClusterFilter::new(),
        vec![cluster(&["r1", "r2", "m1", "r3", "r4"])],
        &store,
    );
    assert_eq!(retained, vec![vec!["r1", "r2", "r3", "r4"]]);
}

#[test]
fn test_duplicates_do_not_count_towards_minimum() {
    let store = myrtales_store();
    let outcome = ClusterFilter::new()
        .filter(vec![cluster(&["r1", "m1", "r2", "m2", "r3"])], &store)
        .unwrap();
    assert_eq!(outcome.discarded.len(), 1);
}

#[test]
fn test_keep_longest_ties_go_to_earlier_key() {
    let store = store(vec![
        record("a", "Lythrum salicaria", LYTHRACEAE, "rbcL", 100),
        record("b", "Lythrum salicaria", LYTHRACEAE, "rbcL", 100),
        record("c", "Lythrum salicaria", LYTHRACEAE, "rbcL", 90),
        record("d", "Cuphea viscosissima", LYTHRACEAE, "rbcL", 100),
    ]);
    let filter = ClusterFilter::new()
        .with_min_taxa(2)
        .with_policy(DuplicatePolicy::KeepLongest);
    let retained = retained_ids(&filter, vec![cluster(&["c", "a", "b", "d"])], &store);
    assert_eq!(retained, vec![vec!["a", "d"]]);
}

#[test]
fn test_min_taxa_is_configurable() {
    let store = myrtales_store();
    let retained = retained_ids(
        &ClusterFilter::new().with_min_taxa(2),
        vec![cluster(&["p1"]), cluster(&["r1", "r2"])],
        &store,
    );
    assert_eq!(retained, vec![vec!["r1", "r2"]]);
}

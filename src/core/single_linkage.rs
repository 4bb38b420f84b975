/// Single-linkage hierarchical clustering over an owned distance matrix

use super::cluster::Cluster;
use super::distance_matrix::DistanceMatrix;
use crate::bio::sequence::SequenceKey;
use crate::{Result, SumacError};
use tracing::{debug, info};

/// One merge step: `absorbed` was folded into `kept` at `distance`.
///
/// Ids are matrix row indices, which stay stable for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub kept: usize,
    pub absorbed: usize,
    pub distance: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ClusteringOutcome {
    pub clusters: Vec<Cluster>,
    pub merges: Vec<Merge>,
}

impl ClusteringOutcome {
    pub fn merge_count(&self) -> usize {
        self.merges.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleLinkageClusterer;

impl SingleLinkageClusterer {
    pub fn new() -> Self {
        Self
    }

    /// Merge the closest pair of clusters until none is within `threshold`.
    ///
    /// `keys[i]` labels matrix row `i`. Clusters come back in row order of
    /// the rows that survived.
    pub fn cluster(
        &self,
        keys: Vec<SequenceKey>,
        mut matrix: DistanceMatrix,
        threshold: f64,
    ) -> Result<ClusteringOutcome> {
        if keys.len() != matrix.size() {
            return Err(SumacError::Invariant(format!(
                "{} keys for a {}x{} distance matrix",
                keys.len(),
                matrix.size(),
                matrix.size()
            )));
        }
        if threshold.is_nan() {
            return Err(SumacError::Config("clustering threshold is NaN".to_string()));
        }

        let mut members: Vec<Cluster> = keys.into_iter().map(Cluster::singleton).collect();
        let mut live: Vec<usize> = (0..members.len()).collect();
        let mut merges = Vec::new();

        while live.len() >= 2 {
            let (pos1, pos2, distance) = closest_pair(&matrix, &live);
            if distance > threshold {
                break;
            }
            let (c1, c2) = (live[pos1], live[pos2]);

            let absorbed = std::mem::take(&mut members[c2]);
            members[c1].absorb(absorbed);
            merge_rows(&mut matrix, &live, c1, c2);
            live.remove(pos2);

            debug_assert_eq!(matrix.get(c1, c1), 0.0);
            debug_assert!(live.iter().all(|&i| matrix.get(c1, i) == matrix.get(i, c1)));
            merges.push(Merge {
                kept: c1,
                absorbed: c2,
                distance,
            });
        }

        let clusters: Vec<Cluster> = live
            .iter()
            .map(|&id| std::mem::take(&mut members[id]))
            .collect();
        info!(
            "Single linkage finished with {} clusters after {} merges",
            clusters.len(),
            merges.len()
        );
        if let Some(last) = merges.last() {
            debug!("Last merge at distance {}", last.distance);
        }
        Ok(ClusteringOutcome { clusters, merges })
    }
}

/// Fold row `c2` into row `c1` with the single-linkage rule
/// d(c1, i) = min(d(c1, i), d(c2, i)) for every other live id.
fn merge_rows(matrix: &mut DistanceMatrix, live: &[usize], c1: usize, c2: usize) {
    for &other in live {
        if other != c1 && other != c2 {
            let d = matrix.get(c1, other).min(matrix.get(c2, other));
            matrix.set(c1, other, d);
        }
    }
}

/// Positions in `live` of the closest pair and their distance.
///
/// Scans the upper triangle row by row; the first minimum wins and an exact
/// zero ends the scan early. Requires at least two live ids.
fn closest_pair(matrix: &DistanceMatrix, live: &[usize]) -> (usize, usize, f64) {
    let mut best = (0, 1, f64::INFINITY);
    for (a, &i) in live.iter().enumerate() {
        for (b, &j) in live.iter().enumerate().skip(a + 1) {
            let d = matrix.get(i, j);
            if d < best.2 {
                best = (a, b, d);
                if d == 0.0 {
                    return best;
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(ids: &[&str]) -> Vec<SequenceKey> {
        ids.iter().map(|id| SequenceKey::from(*id)).collect()
    }

    fn ids(cluster: &Cluster) -> Vec<&str> {
        cluster.iter().map(SequenceKey::as_str).collect()
    }

    #[test]
    fn test_closest_pair_prefers_first_tie() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 3.0, 2.0],
            vec![3.0, 0.0, 2.0],
            vec![2.0, 2.0, 0.0],
        ])
        .unwrap();
        assert_eq!(closest_pair(&matrix, &[0, 1, 2]), (0, 2, 2.0));
        assert_eq!(closest_pair(&matrix, &[1, 2]), (0, 1, 2.0));
    }

    #[test]
    fn test_merged_row_takes_minimum() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 6.0, 9.0],
            vec![1.0, 0.0, 4.0, 9.0],
            vec![6.0, 4.0, 0.0, 9.0],
            vec![9.0, 9.0, 9.0, 0.0],
        ])
        .unwrap();
        let outcome = SingleLinkageClusterer::new()
            .cluster(keys(&["a", "b", "c", "d"]), matrix, 5.0)
            .unwrap();

        assert_eq!(outcome.clusters.len(), 2);
        assert_eq!(ids(&outcome.clusters[0]), vec!["a", "b", "c"]);
        assert_eq!(ids(&outcome.clusters[1]), vec!["d"]);
        assert_eq!(outcome.merges[0], Merge { kept: 0, absorbed: 1, distance: 1.0 });
        assert_eq!(outcome.merges[1], Merge { kept: 0, absorbed: 2, distance: 4.0 });
    }

    #[test]
    fn test_matrix_stays_symmetric_across_merges() {
        let mut matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 6.0, 9.0, 3.0],
            vec![1.0, 0.0, 4.0, 2.0, 8.0],
            vec![6.0, 4.0, 0.0, 9.0, 7.0],
            vec![9.0, 2.0, 9.0, 0.0, 5.0],
            vec![3.0, 8.0, 7.0, 5.0, 0.0],
        ])
        .unwrap();
        let mut live: Vec<usize> = (0..5).collect();

        while live.len() >= 2 {
            let (pos1, pos2, _) = closest_pair(&matrix, &live);
            let (c1, c2) = (live[pos1], live[pos2]);
            let expected: Vec<f64> = live
                .iter()
                .map(|&i| matrix.get(c1, i).min(matrix.get(c2, i)))
                .collect();

            merge_rows(&mut matrix, &live, c1, c2);

            for (&i, &d) in live.iter().zip(&expected) {
                if i != c1 && i != c2 {
                    assert_eq!(matrix.get(c1, i), d);
                }
            }
            live.remove(pos2);
            assert!(matrix.is_symmetric());
            assert!(live.iter().all(|&i| matrix.get(i, i) == 0.0));
        }
    }

    #[test]
    fn test_size_mismatch_is_invariant_error() {
        let matrix = DistanceMatrix::zeros(2);
        let result = SingleLinkageClusterer::new().cluster(keys(&["a"]), matrix, 1.0);
        assert!(matches!(result, Err(SumacError::Invariant(_))));
    }

    #[test]
    fn test_empty_and_single() {
        let outcome = SingleLinkageClusterer::new()
            .cluster(Vec::new(), DistanceMatrix::zeros(0), 1.0)
            .unwrap();
        assert!(outcome.clusters.is_empty());

        let outcome = SingleLinkageClusterer::new()
            .cluster(keys(&["a"]), DistanceMatrix::zeros(1), 1.0)
            .unwrap();
        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.merge_count(), 0);
    }
}

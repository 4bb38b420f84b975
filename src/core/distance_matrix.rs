/// Pairwise distance matrix construction over a set of sequence keys

use crate::bio::sequence::{Sequence, SequenceKey};
use crate::storage::SequenceStore;
use crate::tools::SimilarityOracle;
use crate::utils::progress::create_progress_bar;
use crate::{Result, SumacError};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Distance for pairs whose lengths are too different to compare
pub const INCOMPARABLE_DISTANCE: f64 = 50.0;
/// Distance for compared pairs without a significant hit
pub const NO_HIT_DISTANCE: f64 = 10.0;

/// Square, symmetric matrix with a zero diagonal, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// All-zero matrix of the given size
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Build from explicit rows, validating shape, symmetry, diagonal and values.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(SumacError::Invariant(format!(
                    "distance matrix row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            values.extend(row);
        }
        let matrix = Self { size, values };

        for i in 0..size {
            if matrix.get(i, i) != 0.0 {
                return Err(SumacError::Invariant(format!(
                    "distance matrix diagonal at {} is {}",
                    i,
                    matrix.get(i, i)
                )));
            }
            for j in 0..size {
                let d = matrix.get(i, j);
                if !d.is_finite() || d < 0.0 {
                    return Err(SumacError::Invariant(format!(
                        "distance matrix value at ({}, {}) is {}",
                        i, j, d
                    )));
                }
                if d != matrix.get(j, i) {
                    return Err(SumacError::Invariant(format!(
                        "distance matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(matrix)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Set d(i, j) and d(j, i)
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Symmetric with a zero diagonal
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| {
            self.get(i, i) == 0.0 && (i + 1..self.size).all(|j| self.get(i, j) == self.get(j, i))
        })
    }
}

/// Whether a length `a` lies within `[(1 - t) * b, (1 + t) * b]`, bounds included.
pub fn lengths_comparable(a: usize, b: usize, threshold: f64) -> bool {
    let (a, b) = (a as f64, b as f64);
    a >= b * (1.0 - threshold) && a <= b * (1.0 + threshold)
}

/// A configured distance must be a finite, non-negative number.
pub fn check_distance(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SumacError::Config(format!(
            "{} must be a finite non-negative number, got {}",
            name, value
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PairScore {
    Incomparable,
    Hit(f64),
    NoHit,
    Failed,
}

#[derive(Debug, Clone)]
pub struct MatrixBuild {
    pub matrix: DistanceMatrix,
    pub oracle_calls: usize,
    pub pruned_pairs: usize,
    pub failed_comparisons: usize,
}

pub struct DistanceMatrixBuilder<'a> {
    oracle: &'a dyn SimilarityOracle,
    length_threshold: f64,
    incomparable_distance: f64,
    no_hit_distance: f64,
    parallel: bool,
    show_progress: bool,
}

impl<'a> DistanceMatrixBuilder<'a> {
    pub fn new(oracle: &'a dyn SimilarityOracle) -> Self {
        Self {
            oracle,
            length_threshold: 0.5,
            incomparable_distance: INCOMPARABLE_DISTANCE,
            no_hit_distance: NO_HIT_DISTANCE,
            parallel: false,
            show_progress: false,
        }
    }

    pub fn with_length_threshold(mut self, threshold: f64) -> Self {
        self.length_threshold = threshold;
        self
    }

    pub fn with_distances(mut self, incomparable: f64, no_hit: f64) -> Self {
        self.incomparable_distance = incomparable;
        self.no_hit_distance = no_hit;
        self
    }

    /// Score pairs on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Compute the full matrix for `keys`, in key order.
    ///
    /// Each unordered pair is scored once and mirrored. Oracle failures are
    /// recorded as no-hit and counted rather than aborting the build; an
    /// unknown key aborts it.
    pub fn build(&self, keys: &[SequenceKey], store: &dyn SequenceStore) -> Result<MatrixBuild> {
        check_distance("incomparable_distance", self.incomparable_distance)?;
        check_distance("no_hit_distance", self.no_hit_distance)?;

        let sequences = keys
            .iter()
            .map(|key| store.get(key))
            .collect::<Result<Vec<Arc<Sequence>>>>()?;

        let n = sequences.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        info!(
            "Building {}x{} distance matrix ({} pairs) with {}",
            n,
            n,
            pairs.len(),
            self.oracle.name()
        );

        let pb = create_progress_bar(pairs.len() as u64, "Comparing sequence pairs", self.show_progress);
        let score = |&(i, j): &(usize, usize)| {
            let result = self.score_pair(&sequences[i], &sequences[j]);
            pb.inc(1);
            result
        };
        let scores: Vec<PairScore> = if self.parallel {
            pairs.par_iter().map(score).collect()
        } else {
            pairs.iter().map(score).collect()
        };
        pb.finish_and_clear();

        let mut matrix = DistanceMatrix::zeros(n);
        let mut oracle_calls = 0;
        let mut pruned_pairs = 0;
        let mut failed_comparisons = 0;
        for (&(i, j), pair_score) in pairs.iter().zip(scores) {
            let distance = match pair_score {
                PairScore::Incomparable => {
                    pruned_pairs += 1;
                    self.incomparable_distance
                }
                PairScore::Hit(score) => {
                    oracle_calls += 1;
                    score
                }
                PairScore::NoHit => {
                    oracle_calls += 1;
                    self.no_hit_distance
                }
                PairScore::Failed => {
                    oracle_calls += 1;
                    failed_comparisons += 1;
                    self.no_hit_distance
                }
            };
            matrix.set(i, j, distance);
        }
        if !matrix.is_symmetric() {
            return Err(SumacError::Invariant(
                "distance matrix lost symmetry or its zero diagonal".to_string(),
            ));
        }

        debug!(
            "Distance matrix done: {} oracle calls, {} pruned by length, {} failed",
            oracle_calls, pruned_pairs, failed_comparisons
        );
        Ok(MatrixBuild {
            matrix,
            oracle_calls,
            pruned_pairs,
            failed_comparisons,
        })
    }

    fn score_pair(&self, a: &Sequence, b: &Sequence) -> PairScore {
        if !lengths_comparable(a.len(), b.len(), self.length_threshold) {
            return PairScore::Incomparable;
        }
        match self.oracle.compare(a, b) {
            Ok(Some(score)) if score.is_finite() && score >= 0.0 => PairScore::Hit(score),
            Ok(Some(score)) => {
                warn!("{} returned unusable score {} for {} vs {}", self.oracle.name(), score, a.id, b.id);
                PairScore::Failed
            }
            Ok(None) => PairScore::NoHit,
            Err(e) => {
                warn!("{} failed on {} vs {}: {:#}", self.oracle.name(), a.id, b.id, e);
                PairScore::Failed
            }
        }
    }
}

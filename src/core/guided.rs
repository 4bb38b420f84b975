/// Parallel assignment of sequences to clusters seeded by guide sequences
///
/// Workers claim guides one at a time from a shared list and compare the
/// claimed guide against every key. All shared bookkeeping lives in a single
/// mutex-guarded struct; oracle calls happen outside the lock.

use super::cluster::Cluster;
use super::distance_matrix::lengths_comparable;
use crate::bio::fasta::parse_fasta;
use crate::bio::sequence::{Sequence, SequenceKey};
use crate::storage::SequenceStore;
use crate::tools::SimilarityOracle;
use crate::utils::parallel::resolve_threads;
use crate::utils::progress::create_progress_bar;
use crate::{Result, SumacError};
use indicatif::ProgressBar;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct GuidedOutcome {
    /// One cluster per guide, in guide order; may be empty
    pub clusters: Vec<Cluster>,
    pub comparisons: usize,
    pub failed_comparisons: usize,
}

struct SharedState {
    claimed: HashSet<usize>,
    clusters: Vec<Cluster>,
}

struct RunContext<'r> {
    guides: &'r [Sequence],
    keys: &'r [SequenceKey],
    lengths: &'r [usize],
    store: &'r dyn SequenceStore,
    state: Mutex<SharedState>,
    comparisons: AtomicUsize,
    failures: AtomicUsize,
    halted: AtomicBool,
    progress: ProgressBar,
}

pub struct GuidedClusterer<'a> {
    oracle: &'a dyn SimilarityOracle,
    length_threshold: f64,
    oracle_threshold: f64,
    workers: usize,
    cancel: Option<Arc<AtomicBool>>,
    show_progress: bool,
}

/// Read guide sequences from a FASTA file.
///
/// A missing or unreadable file is a configuration error.
pub fn load_guides<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SumacError::Config(format!(
            "Guide FASTA file not found: {}",
            path.display()
        )));
    }
    let guides = parse_fasta(path).map_err(|e| {
        SumacError::Config(format!("Failed to read guide FASTA {}: {}", path.display(), e))
    })?;
    if guides.is_empty() {
        return Err(SumacError::Config(format!(
            "Guide FASTA file {} contains no sequences",
            path.display()
        )));
    }
    Ok(guides)
}

impl<'a> GuidedClusterer<'a> {
    pub fn new(oracle: &'a dyn SimilarityOracle) -> Self {
        Self {
            oracle,
            length_threshold: 0.5,
            oracle_threshold: 1.0e-10,
            workers: 0,
            cancel: None,
            show_progress: false,
        }
    }

    pub fn with_length_threshold(mut self, threshold: f64) -> Self {
        self.length_threshold = threshold;
        self
    }

    /// Largest oracle score that still counts as a hit
    pub fn with_oracle_threshold(mut self, threshold: f64) -> Self {
        self.oracle_threshold = threshold;
        self
    }

    /// Worker thread count (0 = all available cores)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn cluster(
        &self,
        guides: &[Sequence],
        keys: &[SequenceKey],
        store: &dyn SequenceStore,
    ) -> Result<GuidedOutcome> {
        let lengths = keys
            .iter()
            .map(|key| store.sequence_length(key))
            .collect::<Result<Vec<usize>>>()?;

        let workers = resolve_threads(self.workers).clamp(1, guides.len().max(1));
        info!(
            "Guided clustering: {} guides x {} sequences on {} workers",
            guides.len(),
            keys.len(),
            workers
        );

        let ctx = RunContext {
            guides,
            keys,
            lengths: &lengths,
            store,
            state: Mutex::new(SharedState {
                claimed: HashSet::with_capacity(guides.len()),
                clusters: vec![Cluster::new(); guides.len()],
            }),
            comparisons: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            halted: AtomicBool::new(false),
            progress: create_progress_bar(guides.len() as u64, "Guides", self.show_progress),
        };

        let results: Vec<Result<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let ctx = &ctx;
                    scope.spawn(move || {
                        let result = self.run_worker(worker, ctx);
                        if result.is_err() {
                            ctx.halted.store(true, Ordering::SeqCst);
                        }
                        result
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(SumacError::Other("guided worker panicked".to_string())))
                })
                .collect()
        });
        ctx.progress.finish_and_clear();

        // Cancellation takes precedence over errors raised by other workers.
        if self.is_cancelled() {
            return Err(SumacError::Cancelled);
        }
        for result in results {
            result?;
        }

        let state = ctx.state.into_inner();
        let outcome = GuidedOutcome {
            clusters: state.clusters,
            comparisons: ctx.comparisons.into_inner(),
            failed_comparisons: ctx.failures.into_inner(),
        };
        info!(
            "Guided clustering done: {} comparisons, {} failed",
            outcome.comparisons, outcome.failed_comparisons
        );
        Ok(outcome)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SumacError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn run_worker(&self, worker: usize, ctx: &RunContext<'_>) -> Result<()> {
        let mut next = 0;
        while let Some(g) = claim_next(&ctx.state, next, ctx.guides.len()) {
            next = g + 1;
            self.check_cancelled()?;
            debug!("Worker {} took guide {} ({})", worker, g, ctx.guides[g].id);
            self.scan_guide(g, ctx)?;
            ctx.progress.inc(1);
        }
        Ok(())
    }

    fn scan_guide(&self, g: usize, ctx: &RunContext<'_>) -> Result<()> {
        let guide = &ctx.guides[g];
        for (key, &length) in ctx.keys.iter().zip(ctx.lengths) {
            self.check_cancelled()?;
            if ctx.halted.load(Ordering::SeqCst) {
                return Ok(());
            }
            if !lengths_comparable(guide.len(), length, self.length_threshold) {
                continue;
            }

            let record = ctx.store.get(key)?;
            ctx.comparisons.fetch_add(1, Ordering::Relaxed);
            match self.oracle.compare(&record, guide) {
                Ok(Some(score)) if score <= self.oracle_threshold => {
                    ctx.state.lock().clusters[g].push(key.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    ctx.failures.fetch_add(1, Ordering::Relaxed);
                    warn!("{} failed on {} vs guide {}: {:#}", self.oracle.name(), key, guide.id, e);
                }
            }
        }
        Ok(())
    }
}

/// Claim the first unclaimed guide at or after `from`.
fn claim_next(state: &Mutex<SharedState>, from: usize, total: usize) -> Option<usize> {
    let mut state = state.lock();
    (from..total).find(|&g| state.claimed.insert(g))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::tools::mock::TableOracle;

    fn seq(id: &str, len: usize) -> Sequence {
        Sequence::new(id.to_string(), vec![b'A'; len])
    }

    #[test]
    fn test_claim_next_never_repeats() {
        let state = Mutex::new(SharedState {
            claimed: HashSet::new(),
            clusters: Vec::new(),
        });
        assert_eq!(claim_next(&state, 0, 3), Some(0));
        assert_eq!(claim_next(&state, 0, 3), Some(1));
        assert_eq!(claim_next(&state, 2, 3), Some(2));
        assert_eq!(claim_next(&state, 0, 3), None);
    }

    #[test]
    fn test_hits_above_threshold_are_ignored() {
        let store = MemoryStore::from_sequences(vec![seq("k1", 100), seq("k2", 100), seq("k3", 500)]).unwrap();
        let oracle = TableOracle::new()
            .with_score("k1", "g", 1e-50)
            .with_score("k2", "g", 1e-3)
            .with_score("k3", "g", 1e-50);

        let outcome = GuidedClusterer::new(&oracle)
            .with_workers(1)
            .cluster(&[seq("g", 100)], &store.keys(), &store)
            .unwrap();

        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.clusters[0].keys(), &[SequenceKey::from("k1")]);
        // k3 is filtered on length before any comparison
        assert_eq!(outcome.comparisons, 2);
    }

    #[test]
    fn test_missing_guide_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_guides(dir.path().join("guides.fasta"));
        assert!(matches!(result, Err(SumacError::Config(_))));
    }
}

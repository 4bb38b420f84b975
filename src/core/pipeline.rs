/// End-to-end supermatrix construction
///
/// Selects ingroup and outgroup records, clusters them, keeps clusters with
/// enough taxa, aligns each cluster and concatenates the alignments. All
/// artifacts are written below the configured output directory.

use super::cluster::Cluster;
use super::cluster_filter::{ClusterFilter, TaxonCluster};
use super::config::Config;
use super::distance_matrix::DistanceMatrixBuilder;
use super::guided::GuidedClusterer;
use super::single_linkage::SingleLinkageClusterer;
use super::supermatrix::{region_description, AlignedBlock, Supermatrix, SupermatrixAssembler};
use crate::bio::fasta::write_fasta;
use crate::bio::sequence::{Sequence, SequenceKey};
use crate::report::{self, RegionSummary};
use crate::storage::SequenceStore;
use crate::tools::{MultipleAligner, SimilarityOracle};
use crate::utils::progress::create_progress_bar;
use crate::{Result, SumacError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub const CLUSTERS_DIR: &str = "clusters";
pub const ALIGNMENTS_DIR: &str = "alignments";
pub const FINAL_ALIGNMENT: &str = "final.fasta";

/// How sequences are grouped into candidate loci
#[derive(Debug, Clone)]
pub enum ClusteringStrategy {
    /// All-vs-all distance matrix followed by single linkage
    SingleLinkage,
    /// Assignment to clusters seeded by these guide sequences
    Guided(Vec<Sequence>),
}

#[derive(Debug, Clone, Default)]
pub struct KeySelection {
    pub ingroup: Vec<SequenceKey>,
    pub outgroup: Vec<SequenceKey>,
}

impl KeySelection {
    /// Ingroup keys followed by outgroup keys
    pub fn all(&self) -> Vec<SequenceKey> {
        self.ingroup.iter().chain(&self.outgroup).cloned().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub ingroup_sequences: usize,
    pub outgroup_sequences: usize,
    pub clusters_found: usize,
    pub clusters_kept: usize,
    pub clusters_discarded: usize,
    pub failed_comparisons: usize,
    pub failed_alignments: usize,
    pub regions: Vec<RegionSummary>,
    pub taxa: usize,
    pub supermatrix_length: usize,
    pub final_alignment: PathBuf,
}

/// Records whose lineage names `ingroup`, then those naming `outgroup`.
///
/// A record matching both clades is counted once, as ingroup.
pub fn select_keys(store: &dyn SequenceStore, ingroup: &str, outgroup: &str) -> Result<KeySelection> {
    let mut selection = KeySelection::default();
    for key in store.keys() {
        if store.in_clade(&key, ingroup)? {
            selection.ingroup.push(key);
        } else if store.in_clade(&key, outgroup)? {
            selection.outgroup.push(key);
        }
    }
    info!(
        "Found {} ingroup ({}) and {} outgroup ({}) sequences",
        selection.ingroup.len(),
        ingroup,
        selection.outgroup.len(),
        outgroup
    );
    Ok(selection)
}

/// Member records of `cluster` with descriptions rewritten to
/// `<taxon> <region>`, so that [`AlignedBlock::from_fasta`] reads back the
/// same taxa. The region is taken from the first record's definition.
fn labelled_records(cluster: &TaxonCluster, store: &dyn SequenceStore) -> Result<(String, Vec<Sequence>)> {
    let mut region = None;
    let mut records = Vec::with_capacity(cluster.len());
    for (taxon, key) in cluster.members() {
        let mut record = (*store.get(key)?).clone();
        let region = region.get_or_insert_with(|| {
            record
                .description
                .as_deref()
                .map(region_description)
                .unwrap_or_default()
        });
        record.description = Some(format!("{} {}", taxon, region).trim_end().to_string());
        records.push(record);
    }
    Ok((region.unwrap_or_default(), records))
}

pub struct Pipeline<'a> {
    config: &'a Config,
    oracle: &'a dyn SimilarityOracle,
    aligner: &'a dyn MultipleAligner,
    strategy: ClusteringStrategy,
    show_progress: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        oracle: &'a dyn SimilarityOracle,
        aligner: &'a dyn MultipleAligner,
    ) -> Self {
        Self {
            config,
            oracle,
            aligner,
            strategy: ClusteringStrategy::SingleLinkage,
            show_progress: false,
            cancel: None,
        }
    }

    pub fn with_strategy(mut self, strategy: ClusteringStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self, store: &dyn SequenceStore, ingroup: &str, outgroup: &str) -> Result<PipelineSummary> {
        self.config.validate()?;
        let output = &self.config.output.directory;
        let clusters_dir = output.join(CLUSTERS_DIR);
        let alignments_dir = output.join(ALIGNMENTS_DIR);
        std::fs::create_dir_all(&clusters_dir)?;
        std::fs::create_dir_all(&alignments_dir)?;

        let selection = select_keys(store, ingroup, outgroup)?;
        let keys = selection.all();
        if keys.is_empty() {
            return Err(SumacError::Config(format!(
                "No sequences found for ingroup '{}' or outgroup '{}'",
                ingroup, outgroup
            )));
        }

        let mut summary = PipelineSummary {
            ingroup_sequences: selection.ingroup.len(),
            outgroup_sequences: selection.outgroup.len(),
            ..Default::default()
        };

        let (clusters, failed_comparisons) = self.cluster(keys, store)?;
        summary.clusters_found = clusters.len();
        summary.failed_comparisons = failed_comparisons;

        let filtered = ClusterFilter::new()
            .with_min_taxa(self.config.clustering.min_taxa)
            .with_policy(self.config.clustering.duplicate_policy)
            .filter(clusters, store)?;
        summary.clusters_kept = filtered.retained.len();
        summary.clusters_discarded = filtered.discarded.len();

        let members = self.write_clusters(&filtered.retained, store, &clusters_dir)?;
        let (blocks, failed_alignments) = self.align_clusters(&filtered.retained, members, &alignments_dir)?;
        summary.failed_alignments = failed_alignments;

        let matrix = SupermatrixAssembler::concatenate(&blocks)?;
        summary.regions = report::summarize(&blocks, &matrix);
        summary.final_alignment = alignments_dir.join(FINAL_ALIGNMENT);
        self.write_outputs(&matrix, &summary.regions, &summary.final_alignment)?;
        summary.taxa = matrix.taxa_count();
        summary.supermatrix_length = matrix.length();

        info!(
            "Supermatrix: {} taxa x {} columns from {} regions",
            summary.taxa,
            summary.supermatrix_length,
            summary.regions.len()
        );
        Ok(summary)
    }

    fn cluster(&self, keys: Vec<SequenceKey>, store: &dyn SequenceStore) -> Result<(Vec<Cluster>, usize)> {
        let clustering = &self.config.clustering;
        match &self.strategy {
            ClusteringStrategy::SingleLinkage => {
                let build = DistanceMatrixBuilder::new(self.oracle)
                    .with_length_threshold(clustering.length_threshold)
                    .with_distances(clustering.incomparable_distance, clustering.no_hit_distance)
                    .with_parallel(self.config.performance.parallel_distances)
                    .with_progress(self.show_progress)
                    .build(&keys, store)?;
                let outcome = SingleLinkageClusterer::new().cluster(
                    keys,
                    build.matrix,
                    clustering.evalue_threshold,
                )?;
                Ok((outcome.clusters, build.failed_comparisons))
            }
            ClusteringStrategy::Guided(guides) => {
                let mut clusterer = GuidedClusterer::new(self.oracle)
                    .with_length_threshold(clustering.length_threshold)
                    .with_oracle_threshold(clustering.evalue_threshold)
                    .with_workers(self.config.performance.threads)
                    .with_progress(self.show_progress);
                if let Some(flag) = &self.cancel {
                    clusterer = clusterer.with_cancel_flag(flag.clone());
                }
                let outcome = clusterer.cluster(guides, &keys, store)?;
                Ok((outcome.clusters, outcome.failed_comparisons))
            }
        }
    }

    /// Write `clusters/<i>.fasta` for every retained cluster and return the
    /// region description and labelled member records of each.
    fn write_clusters(
        &self,
        clusters: &[TaxonCluster],
        store: &dyn SequenceStore,
        dir: &Path,
    ) -> Result<Vec<(String, Vec<Sequence>)>> {
        clusters
            .iter()
            .enumerate()
            .map(|(i, cluster)| {
                let (region, records) = labelled_records(cluster, store)?;
                write_fasta(dir.join(format!("{}.fasta", i)), &records)?;
                Ok((region, records))
            })
            .collect()
    }

    /// Align clusters on the rayon pool. Failed alignments are logged,
    /// counted and left out; surviving blocks keep cluster order.
    fn align_clusters(
        &self,
        clusters: &[TaxonCluster],
        members: Vec<(String, Vec<Sequence>)>,
        dir: &Path,
    ) -> Result<(Vec<AlignedBlock>, usize)> {
        let pb = create_progress_bar(clusters.len() as u64, "Aligning clusters", self.show_progress);
        let results: Vec<Result<Option<AlignedBlock>>> = clusters
            .par_iter()
            .zip(members.into_par_iter())
            .enumerate()
            .map(|(i, (cluster, (region, records)))| {
                let block = match self.align_cluster(cluster, region, &records) {
                    Ok((aligned, block)) => {
                        write_fasta(dir.join(format!("{}.fasta", i)), &aligned)?;
                        Some(block)
                    }
                    Err(e) => {
                        warn!("Dropping cluster {}: {}", i, e);
                        None
                    }
                };
                pb.inc(1);
                Ok(block)
            })
            .collect();
        pb.finish_and_clear();

        let mut blocks = Vec::with_capacity(results.len());
        let mut failed = 0;
        for result in results {
            match result? {
                Some(block) => blocks.push(block),
                None => failed += 1,
            }
        }
        Ok((blocks, failed))
    }

    fn align_cluster(
        &self,
        cluster: &TaxonCluster,
        region: String,
        records: &[Sequence],
    ) -> Result<(Vec<Sequence>, AlignedBlock)> {
        let aligned = self
            .aligner
            .align(records)
            .map_err(|e| SumacError::Alignment(format!("{}: {:#}", self.aligner.name(), e)))?;

        let locus_length = aligned.first().map(Sequence::len).unwrap_or(0);
        let mut block = AlignedBlock::new(region, locus_length);
        for row in &aligned {
            if row.len() != locus_length {
                return Err(SumacError::Alignment(format!(
                    "row {} has length {}, expected {}",
                    row.id,
                    row.len(),
                    locus_length
                )));
            }
            let taxon = cluster
                .taxon_of(&row.key())
                .ok_or_else(|| SumacError::Alignment(format!("unexpected record {} in alignment", row.id)))?;
            block.insert(taxon.clone(), row.sequence.clone());
        }
        Ok((aligned, block))
    }

    fn write_outputs(&self, matrix: &Supermatrix, regions: &[RegionSummary], final_path: &Path) -> Result<()> {
        matrix.write_fasta(final_path, self.config.output.line_width)?;
        if self.config.output.write_csv {
            report::write_csv(self.config.output.directory.join(report::CSV_FILE_NAME), regions)?;
        }
        Ok(())
    }
}

use crate::cli::formatter::{self, format_number, print_item, print_stats_table, print_success, print_warning};
use crate::cli::GlobalOptions;
use crate::core::cluster_filter::DuplicatePolicy;
use crate::core::config::Config;
use crate::core::guided::load_guides;
use crate::core::pipeline::{ClusteringStrategy, Pipeline, PipelineSummary};
use crate::report;
use crate::storage::{IndexedStore, SequenceStore};
use crate::tools::{BlastnOracle, MultipleAligner, MuscleAligner, SimilarityOracle};
use crate::SumacError;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DuplicateArg {
    /// Keep the first sequence of each taxon in cluster order
    KeepFirst,
    /// Keep the longest sequence of each taxon
    KeepLongest,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::KeepFirst => DuplicatePolicy::KeepFirst,
            DuplicateArg::KeepLongest => DuplicatePolicy::KeepLongest,
        }
    }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Ingroup clade (any rank of the GenBank lineage, or a genus)
    #[arg(short, long)]
    pub ingroup: String,

    /// Outgroup clade
    #[arg(short, long)]
    pub outgroup: String,

    /// Indexed GenBank directory (see `sumac index`)
    #[arg(short = 'g', long, value_name = "DIR", default_value = "genbank")]
    pub genbank_dir: PathBuf,

    /// BLAST e-value threshold for clustering
    #[arg(short, long)]
    pub evalue: Option<f64>,

    /// Allowed fractional sequence length difference (e.g. 0.5)
    #[arg(short, long)]
    pub length: Option<f64>,

    /// FASTA of guide sequences; switches to guided clustering
    #[arg(long, value_name = "FASTA")]
    pub guides: Option<PathBuf>,

    /// Minimum number of distinct taxa per cluster
    #[arg(long)]
    pub min_taxa: Option<usize>,

    /// Which sequence to keep when a cluster holds several of one taxon
    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicateArg>,

    /// Output directory for clusters/, alignments/ and the CSV summary
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Score distance matrix pairs in parallel
    #[arg(long)]
    pub parallel_distances: bool,

    /// Path to blastn (default: found on PATH)
    #[arg(long, value_name = "FILE")]
    pub blastn: Option<PathBuf>,

    /// Path to muscle (default: found on PATH)
    #[arg(long, value_name = "FILE")]
    pub muscle: Option<PathBuf>,
}

pub fn run(args: BuildArgs, mut config: Config, global: &GlobalOptions) -> anyhow::Result<()> {
    let clustering = &mut config.clustering;
    if let Some(evalue) = args.evalue {
        clustering.evalue_threshold = evalue;
    }
    if let Some(length) = args.length {
        clustering.length_threshold = length;
    }
    if let Some(min_taxa) = args.min_taxa {
        clustering.min_taxa = min_taxa;
    }
    if let Some(duplicates) = args.duplicates {
        clustering.duplicate_policy = duplicates.into();
    }
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if args.parallel_distances {
        config.performance.parallel_distances = true;
    }
    if args.blastn.is_some() {
        config.tools.blastn = args.blastn;
    }
    if args.muscle.is_some() {
        config.tools.muscle = args.muscle;
    }
    config.validate()?;

    // Everything that can fail cheaply is checked before clustering starts
    let strategy = match &args.guides {
        Some(path) => ClusteringStrategy::Guided(load_guides(path)?),
        None => ClusteringStrategy::SingleLinkage,
    };
    let store = IndexedStore::open(&args.genbank_dir)?;
    let oracle = BlastnOracle::locate(config.tools.blastn.as_deref())
        .and_then(|oracle| oracle.verify_installation().map(|_| oracle))
        .map_err(|e| SumacError::Config(format!("{:#}", e)))?;
    let aligner = MuscleAligner::locate(config.tools.muscle.as_deref())
        .and_then(|aligner| aligner.verify_installation().map(|_| aligner))
        .map_err(|e| SumacError::Config(format!("{:#}", e)))?;

    formatter::print_section("SUMAC: supermatrix constructor");
    print_item("Ingroup", &args.ingroup);
    print_item("Outgroup", &args.outgroup);
    print_item("Sequences indexed", &format_number(store.len()));
    print_item("E-value threshold", &config.clustering.evalue_threshold.to_string());
    print_item("Length threshold", &config.clustering.length_threshold.to_string());
    match &strategy {
        ClusteringStrategy::SingleLinkage => print_item("Clustering", "distance matrix + single linkage"),
        ClusteringStrategy::Guided(guides) => {
            print_item("Clustering", &format!("guided by {} sequences", guides.len()))
        }
    }

    let summary = Pipeline::new(&config, &oracle, &aligner)
        .with_strategy(strategy)
        .with_progress(formatter::interactive_output(global.plain))
        .run(&store, &args.ingroup, &args.outgroup)?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &PipelineSummary) {
    print_stats_table(
        "Clustering",
        vec![
            ("Ingroup sequences", format_number(summary.ingroup_sequences)),
            ("Outgroup sequences", format_number(summary.outgroup_sequences)),
            ("Clusters found", format_number(summary.clusters_found)),
            ("Clusters kept", format_number(summary.clusters_kept)),
            ("Clusters discarded", format_number(summary.clusters_discarded)),
            ("Failed comparisons", format_number(summary.failed_comparisons)),
            ("Failed alignments", format_number(summary.failed_alignments)),
        ],
    );
    if !summary.regions.is_empty() {
        println!("\n{}", report::region_table(&summary.regions));
    }
    if summary.failed_comparisons > 0 || summary.failed_alignments > 0 {
        print_warning("Some comparisons or alignments failed; see the log for details");
    }
    print_success(&format!(
        "Final alignment: {} ({} taxa x {} columns)",
        summary.final_alignment.display(),
        format_number(summary.taxa),
        format_number(summary.supermatrix_length)
    ));
}

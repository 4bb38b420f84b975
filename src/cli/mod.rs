pub mod commands;
pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sumac",
    version,
    about = "Supermatrix constructor for phylogenetic analysis",
    long_about = "SUMAC clusters GenBank sequences of an ingroup and outgroup into homologous \
                  loci, aligns every locus with MUSCLE and concatenates the alignments into one \
                  gap-padded supermatrix."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,

    /// Disable colors and progress bars
    #[arg(long, global = true)]
    pub plain: bool,

    /// Configuration file (defaults to $SUMAC_CONFIG, then ./sumac.toml)
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "SUMAC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a directory of GenBank flat files
    Index(commands::index::IndexArgs),

    /// Cluster, align and concatenate ingroup/outgroup sequences
    Build(commands::build::BuildArgs),

    /// Concatenate existing aligned FASTA files into a supermatrix
    Concatenate(commands::concatenate::ConcatenateArgs),

    /// Write a configuration file with default settings
    InitConfig(commands::init_config::InitConfigArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub verbose: u8,
    pub threads: Option<usize>,
    pub plain: bool,
    pub config: Option<PathBuf>,
}

impl From<&Cli> for GlobalOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            verbose: cli.verbose,
            threads: cli.threads,
            plain: cli.plain,
            config: cli.config.clone(),
        }
    }
}

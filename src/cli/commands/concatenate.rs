use crate::cli::formatter::{self, format_number, print_success};
use crate::core::config::Config;
use crate::core::supermatrix::{AlignedBlock, SupermatrixAssembler};
use crate::report;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ConcatenateArgs {
    /// Aligned FASTA files, one per locus, in output order
    #[arg(required = true, value_name = "FASTA")]
    pub alignments: Vec<PathBuf>,

    /// Supermatrix output file
    #[arg(short, long, default_value = "final.fasta")]
    pub output: PathBuf,

    /// Also write a per-region CSV summary here
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// FASTA line width (overrides the configuration)
    #[arg(long)]
    pub line_width: Option<usize>,
}

pub fn run(args: ConcatenateArgs, config: Config) -> anyhow::Result<()> {
    let line_width = args.line_width.unwrap_or(config.output.line_width).max(1);

    let blocks = args
        .alignments
        .iter()
        .map(|path| {
            AlignedBlock::from_fasta(path).with_context(|| format!("Failed to load {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!("Concatenating {} alignments", blocks.len());

    let matrix = SupermatrixAssembler::concatenate(&blocks)?;
    matrix
        .write_fasta(&args.output, line_width)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let regions = report::summarize(&blocks, &matrix);
    if let Some(csv_path) = &args.csv {
        report::write_csv(csv_path, &regions)?;
    }

    formatter::print_section("Gene regions");
    println!("{}", report::region_table(&regions));
    print_success(&format!(
        "Supermatrix written to {} ({} taxa x {} columns)",
        args.output.display(),
        format_number(matrix.taxa_count()),
        format_number(matrix.length())
    ));
    Ok(())
}

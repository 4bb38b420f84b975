use crate::cli::formatter::{self, format_number, print_stats_table, print_success, print_tip};
use crate::cli::GlobalOptions;
use crate::storage::index::{GenbankIndex, INDEX_FILE_NAME};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Directory containing GenBank flat files (.seq, .gb, .gbk, .genbank)
    #[arg(value_name = "DIR", default_value = "genbank")]
    pub genbank_dir: PathBuf,

    /// Rebuild the index even if one already exists
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: IndexArgs, global: &GlobalOptions) -> anyhow::Result<()> {
    let index_path = args.genbank_dir.join(INDEX_FILE_NAME);

    if index_path.exists() && !args.force {
        let index = GenbankIndex::load(&index_path)?;
        print_success(&format!(
            "{} already indexed ({} sequences)",
            args.genbank_dir.display(),
            format_number(index.len())
        ));
        print_tip("Pass --force to rebuild the index");
        return Ok(());
    }

    formatter::print_section(&format!("Indexing {}", args.genbank_dir.display()));
    let show_progress = formatter::interactive_output(global.plain);
    let (index, stats) = GenbankIndex::build(&args.genbank_dir, show_progress)?;
    index
        .save(&index_path)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;

    print_stats_table(
        "GenBank index",
        vec![
            ("Files scanned", format_number(stats.files)),
            ("Sequences indexed", format_number(stats.entries)),
            ("Unparsable entries", format_number(stats.unparsable)),
            ("Duplicate accessions", format_number(stats.duplicates)),
        ],
    );
    print_success(&format!("Index written to {}", index_path.display()));
    Ok(())
}

use crate::cli::formatter::{print_success, print_tip};
use crate::cli::GlobalOptions;
use crate::core::config::{default_config, save_config};
use clap::Args;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration
    #[arg(value_name = "FILE", default_value = super::DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file without asking
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitConfigArgs, global: &GlobalOptions) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        if global.plain || !std::io::stdin().is_terminal() {
            anyhow::bail!("{} already exists (use --force to overwrite)", args.path.display());
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", args.path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            return Ok(());
        }
    }

    save_config(&args.path, &default_config())?;
    print_success(&format!("Default configuration written to {}", args.path.display()));
    print_tip("Edit the [clustering] section to change thresholds");
    Ok(())
}

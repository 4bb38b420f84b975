use clap::Parser;
use std::process;
use sumac::cli::{commands, formatter, Cli, Commands, GlobalOptions};
use sumac::core::Config;
use sumac::utils::parallel::{configure_thread_pool, resolve_threads};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // SUMAC_LOG takes precedence; -v raises the default level
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("SUMAC_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.plain)
        .init();

    formatter::init(cli.plain);

    if let Err(e) = run(cli) {
        formatter::print_error(&format!("{:#}", e));

        let exit_code = match e.downcast_ref::<sumac::SumacError>() {
            Some(sumac::SumacError::Config(_)) => 2,
            Some(sumac::SumacError::Io(_)) => 3,
            Some(sumac::SumacError::Parse(_)) | Some(sumac::SumacError::Alignment(_)) => 4,
            Some(sumac::SumacError::Index(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let global = GlobalOptions::from(&cli);

    match cli.command {
        Commands::Index(args) => {
            prepare(&global)?;
            commands::index::run(args, &global)
        }
        Commands::Build(args) => commands::build::run(args, prepare(&global)?, &global),
        Commands::Concatenate(args) => commands::concatenate::run(args, prepare(&global)?),
        Commands::InitConfig(args) => commands::init_config::run(args, &global),
    }
}

/// Resolve the configuration and size the rayon pool from it
fn prepare(global: &GlobalOptions) -> anyhow::Result<Config> {
    let config = commands::resolve_config(global)?;
    let threads = resolve_threads(config.performance.threads);
    configure_thread_pool(threads)?;
    tracing::debug!("Using {} threads", threads);
    Ok(config)
}

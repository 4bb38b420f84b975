pub mod build;
pub mod concatenate;
pub mod index;
pub mod init_config;

use crate::cli::GlobalOptions;
use crate::core::config::{load_config, Config};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "sumac.toml";

/// Configuration from `--config`/`SUMAC_CONFIG`, else `./sumac.toml`, else defaults.
/// `--threads` overrides the file.
pub fn resolve_config(global: &GlobalOptions) -> anyhow::Result<Config> {
    let mut config = match &global.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => load_config(DEFAULT_CONFIG_FILE)?,
        None => Config::default(),
    };
    if let Some(threads) = global.threads {
        config.performance.threads = threads;
    }
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

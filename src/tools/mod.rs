pub mod blast;
pub mod mock;
pub mod muscle;
pub mod traits;

pub use blast::BlastnOracle;
pub use muscle::MuscleAligner;
pub use traits::{MultipleAligner, SimilarityOracle};

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// Resolve a tool binary from an explicit path or from PATH
pub fn resolve_binary(name: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(anyhow!("{} not found at {}", name, path.display())),
        None => which::which(name).map_err(|e| anyhow!("{}: {} (is it installed and on PATH?)", name, e)),
    }
}

use super::traits::SimilarityOracle;
use crate::bio::fasta::write_fasta;
use crate::bio::sequence::Sequence;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::trace;

/// NCBI `blastn` run as a pairwise query/subject comparison.
///
/// Every call works in its own scratch directory which is removed when the
/// call returns, so concurrent workers never share input files.
pub struct BlastnOracle {
    binary_path: PathBuf,
}

impl BlastnOracle {
    pub fn new(binary_path: PathBuf) -> Result<Self> {
        if !binary_path.exists() {
            anyhow::bail!("blastn binary not found at {:?}", binary_path);
        }
        Ok(Self { binary_path })
    }

    /// Use `explicit` if given, otherwise look `blastn` up on PATH.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        Self::new(super::resolve_binary("blastn", explicit)?)
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        tempfile::Builder::new()
            .prefix("sumac-blastn-")
            .tempdir()
            .context("Failed to create blastn scratch directory")
    }
}

impl SimilarityOracle for BlastnOracle {
    fn compare(&self, query: &Sequence, subject: &Sequence) -> Result<Option<f64>> {
        let scratch = self.scratch_dir()?;
        let query_path = scratch.path().join("query.fasta");
        let subject_path = scratch.path().join("subject.fasta");
        write_fasta(&query_path, std::slice::from_ref(query))?;
        write_fasta(&subject_path, std::slice::from_ref(subject))?;

        let output = Command::new(&self.binary_path)
            .arg("-query")
            .arg(&query_path)
            .arg("-subject")
            .arg(&subject_path)
            .arg("-outfmt")
            .arg("6 evalue")
            .output()
            .context("Failed to run blastn")?;

        if !output.status.success() {
            anyhow::bail!(
                "blastn exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let score = parse_best_evalue(&stdout)?;
        trace!("blastn {} vs {}: {:?}", query.id, subject.id, score);
        Ok(score)
    }

    fn name(&self) -> &str {
        "blastn"
    }

    fn verify_installation(&self) -> Result<()> {
        let output = Command::new(&self.binary_path)
            .arg("-version")
            .output()
            .context("Failed to run blastn")?;
        if !output.status.success() {
            anyhow::bail!("blastn -version returned error");
        }
        Ok(())
    }
}

/// E-value of the first HSP of the first hit in `-outfmt "6 evalue"` output.
fn parse_best_evalue(tabular: &str) -> Result<Option<f64>> {
    match tabular.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) => {
            let evalue = line
                .split('\t')
                .next()
                .unwrap_or(line)
                .parse::<f64>()
                .with_context(|| format!("Unexpected blastn output line: {:?}", line))?;
            Ok(Some(evalue))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_best_evalue() {
        assert_eq!(parse_best_evalue("3e-45\n1e-10\n").unwrap(), Some(3e-45));
        assert_eq!(parse_best_evalue("0.0\n").unwrap(), Some(0.0));
        assert_eq!(parse_best_evalue("\n").unwrap(), None);
        assert_eq!(parse_best_evalue("").unwrap(), None);
        assert!(parse_best_evalue("garbage").is_err());
    }

    #[test]
    fn test_missing_binary_rejected() {
        assert!(BlastnOracle::new(PathBuf::from("/nonexistent/blastn")).is_err());
    }
}

use super::traits::MultipleAligner;
use crate::bio::fasta::{parse_fasta, write_fasta};
use crate::bio::sequence::Sequence;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Command-line dialect of the installed MUSCLE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuscleSyntax {
    /// MUSCLE 3.x: `-in <file> -out <file>`
    Classic,
    /// MUSCLE 5.x: `-align <file> -output <file>`
    V5,
}

pub struct MuscleAligner {
    binary_path: PathBuf,
    syntax: MuscleSyntax,
}

impl MuscleAligner {
    pub fn new(binary_path: PathBuf) -> Result<Self> {
        if !binary_path.exists() {
            anyhow::bail!("MUSCLE binary not found at {:?}", binary_path);
        }
        let syntax = detect_syntax(&binary_path);
        debug!("Using MUSCLE at {:?} ({:?} syntax)", binary_path, syntax);
        Ok(Self {
            binary_path,
            syntax,
        })
    }

    /// Use `explicit` if given, otherwise look `muscle` up on PATH.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        Self::new(super::resolve_binary("muscle", explicit)?)
    }

    pub fn with_syntax(mut self, syntax: MuscleSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        match self.syntax {
            MuscleSyntax::Classic => {
                cmd.arg("-in").arg(input).arg("-out").arg(output).arg("-quiet");
            }
            MuscleSyntax::V5 => {
                cmd.arg("-align").arg(input).arg("-output").arg(output);
            }
        }
        cmd
    }
}

fn detect_syntax(binary_path: &Path) -> MuscleSyntax {
    let version = Command::new(binary_path)
        .arg("-version")
        .output()
        .map(|out| {
            let mut text = String::from_utf8_lossy(&out.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            text
        })
        .unwrap_or_default();
    parse_syntax(&version)
}

fn parse_syntax(version_output: &str) -> MuscleSyntax {
    let lower = version_output.to_lowercase();
    let major = lower
        .split_whitespace()
        .skip_while(|word| !word.starts_with("muscle"))
        .nth(1)
        .map(|v| v.trim_start_matches('v'))
        .and_then(|v| v.split('.').next())
        .and_then(|v| v.parse::<u32>().ok());
    match major {
        Some(m) if m >= 5 => MuscleSyntax::V5,
        _ => MuscleSyntax::Classic,
    }
}

impl MultipleAligner for MuscleAligner {
    fn align(&self, sequences: &[Sequence]) -> Result<Vec<Sequence>> {
        let scratch = tempfile::Builder::new()
            .prefix("sumac-muscle-")
            .tempdir()
            .context("Failed to create MUSCLE scratch directory")?;
        let input = scratch.path().join("cluster.fasta");
        let output = scratch.path().join("aligned.fasta");
        write_fasta(&input, sequences)?;

        let result = self
            .command(&input, &output)
            .output()
            .context("Failed to run MUSCLE")?;
        if !result.status.success() {
            anyhow::bail!(
                "MUSCLE exited with {:?}: {}",
                result.status.code(),
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let aligned = parse_fasta(&output).context("Failed to read MUSCLE output")?;
        let expected: HashSet<&str> = sequences.iter().map(|s| s.id.as_str()).collect();
        let returned: HashSet<&str> = aligned.iter().map(|s| s.id.as_str()).collect();
        if expected != returned {
            anyhow::bail!(
                "MUSCLE returned {} records for {} inputs",
                aligned.len(),
                sequences.len()
            );
        }
        Ok(aligned)
    }

    fn name(&self) -> &str {
        "muscle"
    }

    fn verify_installation(&self) -> Result<()> {
        let output = Command::new(&self.binary_path)
            .arg("-version")
            .output()
            .context("Failed to run MUSCLE")?;
        if !output.status.success() {
            anyhow::bail!("MUSCLE -version returned error");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_syntax() {
        assert_eq!(parse_syntax("MUSCLE v3.8.1551 by Robert C. Edgar"), MuscleSyntax::Classic);
        assert_eq!(parse_syntax("muscle 5.1.linux64 [12f0e2]"), MuscleSyntax::V5);
        assert_eq!(parse_syntax(""), MuscleSyntax::Classic);
    }
}

/// Trait definitions for the external tools the pipeline drives
///
/// Both traits take `&self` so a single instance can be shared by the
/// clustering workers and the alignment pool.
use crate::bio::sequence::Sequence;
use anyhow::Result;

/// Pairwise similarity scoring (lower score = more similar)
pub trait SimilarityOracle: Send + Sync {
    /// Score `query` against `subject`.
    ///
    /// `Ok(None)` means no significant hit; `Err` means the tool itself failed
    /// and the caller decides how to account for the pair.
    fn compare(&self, query: &Sequence, subject: &Sequence) -> Result<Option<f64>>;

    /// Get the name of this oracle
    fn name(&self) -> &str;

    /// Verify that the tool is properly installed
    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }
}

/// Multiple sequence alignment of one cluster
pub trait MultipleAligner: Send + Sync {
    /// Align `sequences`; the result holds one equal-length row per input id.
    fn align(&self, sequences: &[Sequence]) -> Result<Vec<Sequence>>;

    /// Get the name of this aligner
    fn name(&self) -> &str;

    /// Verify that the tool is properly installed
    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }
}

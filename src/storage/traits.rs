/// Storage abstraction for sequence records
///
/// The clustering engine only needs keyed lookup and key iteration; backends
/// may override the metadata accessors to answer without loading residues.
use crate::bio::sequence::{Sequence, SequenceKey, Taxon};
use crate::Result;
use std::sync::Arc;

pub trait SequenceStore: Send + Sync {
    /// Fetch a record by key
    fn get(&self, key: &SequenceKey) -> Result<Arc<Sequence>>;

    /// All keys in store order
    fn keys(&self) -> Vec<SequenceKey>;

    /// Number of records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Residue count of a record
    fn sequence_length(&self, key: &SequenceKey) -> Result<usize> {
        Ok(self.get(key)?.len())
    }

    /// Taxon label of a record
    fn taxon(&self, key: &SequenceKey) -> Result<Taxon> {
        Ok(self.get(key)?.taxon())
    }

    /// Whether a record belongs to the named clade
    fn in_clade(&self, key: &SequenceKey, clade: &str) -> Result<bool> {
        Ok(self.get(key)?.in_clade(clade))
    }
}

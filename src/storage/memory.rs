use super::traits::SequenceStore;
use crate::bio::fasta::parse_fasta;
use crate::bio::sequence::{Sequence, SequenceKey};
use crate::{Result, SumacError};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// Store holding every record in memory, in insertion order
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: IndexMap<SequenceKey, Arc<Sequence>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sequences<I>(sequences: I) -> Result<Self>
    where
        I: IntoIterator<Item = Sequence>,
    {
        let mut store = Self::new();
        for seq in sequences {
            store.insert(seq)?;
        }
        Ok(store)
    }

    /// Load a FASTA file; taxa come from the leading description words.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_sequences(parse_fasta(path)?)
    }

    pub fn insert(&mut self, seq: Sequence) -> Result<()> {
        let key = seq.key();
        if self.records.contains_key(&key) {
            return Err(SumacError::Parse(format!("Duplicate sequence key: {}", key)));
        }
        self.records.insert(key, Arc::new(seq));
        Ok(())
    }
}

impl SequenceStore for MemoryStore {
    fn get(&self, key: &SequenceKey) -> Result<Arc<Sequence>> {
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| SumacError::NotFound(format!("sequence {}", key)))
    }

    fn keys(&self) -> Vec<SequenceKey> {
        self.records.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_order() {
        let store = MemoryStore::from_sequences(vec![
            Sequence::new("b".to_string(), b"AC".to_vec()),
            Sequence::new("a".to_string(), b"ACGT".to_vec()),
        ])
        .unwrap();

        assert_eq!(store.keys(), vec![SequenceKey::from("b"), SequenceKey::from("a")]);
        assert_eq!(store.sequence_length(&SequenceKey::from("a")).unwrap(), 4);
        assert!(matches!(
            store.get(&SequenceKey::from("missing")),
            Err(SumacError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = MemoryStore::from_sequences(vec![
            Sequence::new("a".to_string(), b"AC".to_vec()),
            Sequence::new("a".to_string(), b"GT".to_vec()),
        ]);
        assert!(result.is_err());
    }
}

use crate::bio::sequence::SequenceKey;
use serde::{Deserialize, Serialize};

/// Ordered list of sequence keys grouped by homology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    keys: Vec<SequenceKey>,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(key: SequenceKey) -> Self {
        Self { keys: vec![key] }
    }

    pub fn keys(&self) -> &[SequenceKey] {
        &self.keys
    }

    pub fn push(&mut self, key: SequenceKey) {
        self.keys.push(key);
    }

    /// Append all of `other`'s keys after this cluster's own
    pub fn absorb(&mut self, other: Cluster) {
        self.keys.extend(other.keys);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &SequenceKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceKey> {
        self.keys.iter()
    }
}

impl<'a> IntoIterator for &'a Cluster {
    type Item = &'a SequenceKey;
    type IntoIter = std::slice::Iter<'a, SequenceKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl FromIterator<SequenceKey> for Cluster {
    fn from_iter<I: IntoIterator<Item = SequenceKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a record in a sequence store (accession.version for GenBank).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey(String);

impl SequenceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SequenceKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for SequenceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Genus + species label of a record, e.g. "Lythrum salicaria".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Taxon(String);

impl Taxon {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// First two whitespace-separated words of `text`, if there are any words.
    pub fn from_words(text: &str) -> Option<Self> {
        let words: Vec<&str> = text.split_whitespace().take(2).collect();
        if words.is_empty() {
            None
        } else {
            Some(Self(words.join(" ")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Taxon {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Clade membership shared by every store: `clade` is one of the lineage
/// ranks or the genus, the first word of the organism name.
pub fn lineage_contains(taxonomy: &[String], organism: Option<&str>, clade: &str) -> bool {
    taxonomy.iter().any(|rank| rank == clade)
        || organism.is_some_and(|organism| organism.split_whitespace().next() == Some(clade))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub organism: Option<String>,
    /// Lineage from the root down, e.g. ["Eukaryota", ..., "Onagraceae"]
    pub taxonomy: Vec<String>,
    pub sequence: Vec<u8>,
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            organism: None,
            taxonomy: Vec::new(),
            sequence,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_organism(mut self, organism: String) -> Self {
        self.organism = Some(organism);
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: Vec<String>) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn key(&self) -> SequenceKey {
        SequenceKey::new(self.id.clone())
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Taxon label: organism name if known, otherwise the leading words of
    /// the description, otherwise the record id.
    pub fn taxon(&self) -> Taxon {
        self.organism
            .as_deref()
            .and_then(Taxon::from_words)
            .or_else(|| self.description.as_deref().and_then(Taxon::from_words))
            .unwrap_or_else(|| Taxon::new(self.id.clone()))
    }

    /// Whether `clade` names this record's genus or any rank of its lineage.
    pub fn in_clade(&self, clade: &str) -> bool {
        lineage_contains(&self.taxonomy, self.organism.as_deref(), clade)
    }

    pub fn header(&self) -> String {
        let mut header = format!(">{}", self.id);

        if let Some(desc) = &self.description {
            header.push(' ');
            header.push_str(desc);
        }

        header
    }
}

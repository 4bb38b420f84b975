/// Concatenation of aligned loci into a single gap-padded matrix

use crate::bio::fasta::{parse_fasta, write_record, LINE_WIDTH};
use crate::bio::sequence::Taxon;
use crate::{Result, SumacError};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

pub const GAP: u8 = b'-';

/// Aligned rows of one locus, keyed by taxon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedBlock {
    description: String,
    locus_length: usize,
    rows: IndexMap<Taxon, Vec<u8>>,
}

impl AlignedBlock {
    pub fn new(description: impl Into<String>, locus_length: usize) -> Self {
        Self {
            description: description.into(),
            locus_length,
            rows: IndexMap::new(),
        }
    }

    /// Add a row; returns false and leaves the block unchanged if `taxon` is
    /// already present.
    pub fn insert(&mut self, taxon: Taxon, row: Vec<u8>) -> bool {
        if self.rows.contains_key(&taxon) {
            return false;
        }
        self.rows.insert(taxon, row);
        true
    }

    /// Load an aligned FASTA file.
    ///
    /// Headers are expected as `>id Genus species region...`; the locus length
    /// is taken from the first record and the region description from the
    /// words following its taxon.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let records = parse_fasta(path)?;
        let locus_length = records.first().map(|r| r.len()).unwrap_or(0);
        let description = records
            .first()
            .and_then(|r| r.description.as_deref())
            .map(region_description)
            .unwrap_or_default();

        let mut block = Self::new(description, locus_length);
        for record in records {
            let taxon = record
                .description
                .as_deref()
                .and_then(Taxon::from_words)
                .unwrap_or_else(|| Taxon::new(record.id.clone()));
            if !block.insert(taxon.clone(), record.sequence) {
                warn!(
                    "{}: skipping {} ({} already present)",
                    path.display(),
                    record.id,
                    taxon
                );
            }
        }
        debug!(
            "Loaded block {} with {} taxa, length {}",
            path.display(),
            block.len(),
            block.locus_length
        );
        Ok(block)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn locus_length(&self) -> usize {
        self.locus_length
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, taxon: &Taxon) -> bool {
        self.rows.contains_key(taxon)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Taxon, &[u8])> {
        self.rows.iter().map(|(taxon, row)| (taxon, row.as_slice()))
    }

    fn validate(&self) -> Result<()> {
        for (taxon, row) in &self.rows {
            if row.len() != self.locus_length {
                return Err(SumacError::Invariant(format!(
                    "block '{}': row for {} has length {}, expected {}",
                    self.description,
                    taxon,
                    row.len(),
                    self.locus_length
                )));
            }
        }
        Ok(())
    }
}

/// Text after the leading `Genus species` words of a description
pub fn region_description(description: &str) -> String {
    description
        .split_whitespace()
        .skip(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenated alignment; every row has the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Supermatrix {
    rows: IndexMap<Taxon, Vec<u8>>,
    length: usize,
}

impl Supermatrix {
    /// Taxa in order of first appearance
    pub fn taxa(&self) -> impl Iterator<Item = &Taxon> {
        self.rows.keys()
    }

    pub fn taxa_count(&self) -> usize {
        self.rows.len()
    }

    /// Total aligned length (sum of all locus lengths)
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn row(&self, taxon: &Taxon) -> Option<&[u8]> {
        self.rows.get(taxon).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Taxon, &[u8])> {
        self.rows.iter().map(|(taxon, row)| (taxon, row.as_slice()))
    }

    pub fn write_fasta<P: AsRef<Path>>(&self, path: P, line_width: usize) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_fasta_to_writer(&mut writer, line_width)?;
        writer.flush()?;
        Ok(())
    }

    /// Default-width FASTA rendering
    pub fn to_fasta_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_fasta_to_writer(&mut buffer, LINE_WIDTH)?;
        String::from_utf8(buffer).map_err(|e| SumacError::Other(e.to_string()))
    }

    /// Write rows as `"> <taxon>"` records
    pub fn write_fasta_to_writer<W: Write>(&self, writer: &mut W, line_width: usize) -> Result<()> {
        for (taxon, row) in &self.rows {
            write_record(writer, &format!("> {}", taxon), row, line_width)?;
        }
        Ok(())
    }
}

/// Incrementally builds a [`Supermatrix`] block by block.
#[derive(Debug, Clone, Default)]
pub struct SupermatrixAssembler {
    matrix: Supermatrix,
    blocks: usize,
}

impl SupermatrixAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate `blocks` in order
    pub fn concatenate(blocks: &[AlignedBlock]) -> Result<Supermatrix> {
        let mut assembler = Self::new();
        for block in blocks {
            assembler.add_block(block)?;
        }
        Ok(assembler.finish())
    }

    pub fn add_block(&mut self, block: &AlignedBlock) -> Result<()> {
        block.validate()?;
        let total = self.matrix.length;
        let locus_length = block.locus_length;

        for (taxon, row) in block.rows() {
            let entry = self
                .matrix
                .rows
                .entry(taxon.clone())
                .or_insert_with(|| vec![GAP; total]);
            entry.extend_from_slice(row);
        }
        // Taxa absent from this block are still at the old length
        for row in self.matrix.rows.values_mut() {
            if row.len() == total {
                row.resize(total + locus_length, GAP);
            }
        }

        self.matrix.length = total + locus_length;
        self.blocks += 1;
        debug_assert!(self.matrix.rows.values().all(|row| row.len() == self.matrix.length));
        debug!(
            "Added block {} ({} taxa, {} columns); matrix now {} x {}",
            self.blocks,
            block.len(),
            locus_length,
            self.matrix.taxa_count(),
            self.matrix.length
        );
        Ok(())
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }

    pub fn finish(self) -> Supermatrix {
        self.matrix
    }
}

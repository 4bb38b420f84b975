/// Persistent index over a directory of GenBank flat files
///
/// The index records the byte span of every entry together with the metadata
/// the pipeline needs for key selection and length pre-filtering, so records
/// are only parsed when their residues are actually requested.
use super::traits::SequenceStore;
use crate::bio::genbank::parse_genbank_entry;
use crate::bio::sequence::{lineage_contains, Sequence, SequenceKey, Taxon};
use crate::utils::progress::create_progress_bar;
use crate::{Result, SumacError};
use dashmap::DashMap;
use memmap2::Mmap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const INDEX_FILE_NAME: &str = "gb.idx";
const INDEX_FORMAT_VERSION: u32 = 1;
const GENBANK_EXTENSIONS: &[&str] = &["seq", "gb", "gbk", "genbank"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: SequenceKey,
    pub file: usize,
    pub offset: u64,
    pub length: u64,
    pub taxon: Taxon,
    pub organism: Option<String>,
    pub taxonomy: Vec<String>,
    pub sequence_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenbankIndex {
    format_version: u32,
    pub files: Vec<PathBuf>,
    pub entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexBuildStats {
    pub files: usize,
    pub entries: usize,
    pub unparsable: usize,
    pub duplicates: usize,
}

impl GenbankIndex {
    /// Scan every GenBank file in `dir` and index its entries.
    pub fn build(dir: &Path, show_progress: bool) -> Result<(Self, IndexBuildStats)> {
        if !dir.is_dir() {
            return Err(SumacError::Config(format!(
                "GenBank directory not found: {}",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| GENBANK_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(SumacError::Config(format!(
                "No GenBank files (.seq, .gb, .gbk, .genbank) in {}",
                dir.display()
            )));
        }

        let pb = create_progress_bar(files.len() as u64, "Indexing GenBank files", show_progress);
        let mut stats = IndexBuildStats {
            files: files.len(),
            ..Default::default()
        };
        let mut entries = Vec::new();
        let mut seen: HashMap<SequenceKey, usize> = HashMap::new();

        for (file_idx, path) in files.iter().enumerate() {
            let file = File::open(path)?;
            if file.metadata()?.len() == 0 {
                pb.inc(1);
                continue;
            }
            let mmap = unsafe { Mmap::map(&file)? };
            let spans = entry_spans(&mmap);
            debug!("{}: {} entries", path.display(), spans.len());

            let parsed: Vec<(u64, u64, Result<Sequence>)> = spans
                .par_iter()
                .map(|&(start, end)| {
                    let record = parse_genbank_entry(&mmap[start..end]);
                    (start as u64, (end - start) as u64, record)
                })
                .collect();

            for (offset, length, record) in parsed {
                let record = match record {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Skipping entry at {}:{}: {}", path.display(), offset, e);
                        stats.unparsable += 1;
                        continue;
                    }
                };

                let key = record.key();
                if seen.contains_key(&key) {
                    warn!("Duplicate key {} in {}, keeping first", key, path.display());
                    stats.duplicates += 1;
                    continue;
                }
                seen.insert(key.clone(), entries.len());

                entries.push(IndexEntry {
                    key,
                    file: file_idx,
                    offset,
                    length,
                    taxon: record.taxon(),
                    organism: record.organism.clone(),
                    taxonomy: record.taxonomy.clone(),
                    sequence_length: record.len(),
                });
            }
            pb.inc(1);
        }

        stats.entries = entries.len();
        pb.finish_with_message(format!("Indexed {} sequences", entries.len()));
        info!(
            "Indexed {} sequences from {} files ({} unparsable, {} duplicates)",
            stats.entries, stats.files, stats.unparsable, stats.duplicates
        );

        let files = files
            .into_iter()
            .map(|p| p.canonicalize().unwrap_or(p))
            .collect();

        Ok((
            Self {
                format_version: INDEX_FORMAT_VERSION,
                files,
                entries,
            },
            stats,
        ))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a previously built index; a missing index is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SumacError::Config(format!(
                "GenBank index not found at {}; run `sumac index` first",
                path.display()
            )));
        }
        let file = File::open(path)?;
        let index: Self = bincode::deserialize_from(BufReader::new(file))?;
        if index.format_version != INDEX_FORMAT_VERSION {
            return Err(SumacError::Index(format!(
                "Index format version {} is not supported (expected {}); rebuild it",
                index.format_version, INDEX_FORMAT_VERSION
            )));
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Byte spans `[start, end)` of every `LOCUS` ... `//` entry.
fn entry_spans(data: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut line_start = 0;

    while line_start < data.len() {
        let line_end = data[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|pos| line_start + pos + 1)
            .unwrap_or(data.len());
        let line = &data[line_start..line_end];

        if line.starts_with(b"LOCUS") {
            start = Some(line_start);
        } else if line.starts_with(b"//") {
            if let Some(s) = start.take() {
                spans.push((s, line_end));
            }
        }
        line_start = line_end;
    }

    spans
}

/// `SequenceStore` backed by a `GenbankIndex`, parsing records on demand.
pub struct IndexedStore {
    index: GenbankIndex,
    positions: HashMap<SequenceKey, usize>,
    cache: DashMap<SequenceKey, Arc<Sequence>>,
}

impl IndexedStore {
    pub fn new(index: GenbankIndex) -> Self {
        let positions = index
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.key.clone(), i))
            .collect();
        Self {
            index,
            positions,
            cache: DashMap::new(),
        }
    }

    /// Open `<dir>/gb.idx`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let index = GenbankIndex::load(dir.as_ref().join(INDEX_FILE_NAME))?;
        info!("{} sequences indexed", index.len());
        Ok(Self::new(index))
    }

    fn entry(&self, key: &SequenceKey) -> Result<&IndexEntry> {
        self.positions
            .get(key)
            .map(|&i| &self.index.entries[i])
            .ok_or_else(|| SumacError::NotFound(format!("sequence {}", key)))
    }

    fn read_entry(&self, entry: &IndexEntry) -> Result<Sequence> {
        let path = self.index.files.get(entry.file).ok_or_else(|| {
            SumacError::Index(format!("Entry {} points at unknown file {}", entry.key, entry.file))
        })?;
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut buffer = vec![0u8; entry.length as usize];
        file.read_exact(&mut buffer)?;

        let record = parse_genbank_entry(&buffer)?;
        if record.key() != entry.key {
            return Err(SumacError::Index(format!(
                "Index is stale: expected {} at {}:{}, found {}",
                entry.key,
                path.display(),
                entry.offset,
                record.key()
            )));
        }
        Ok(record)
    }
}

impl SequenceStore for IndexedStore {
    fn get(&self, key: &SequenceKey) -> Result<Arc<Sequence>> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached.clone());
        }
        let entry = self.entry(key)?;
        let record = Arc::new(self.read_entry(entry)?);
        self.cache.insert(key.clone(), record.clone());
        Ok(record)
    }

    fn keys(&self) -> Vec<SequenceKey> {
        self.index.entries.iter().map(|e| e.key.clone()).collect()
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn sequence_length(&self, key: &SequenceKey) -> Result<usize> {
        Ok(self.entry(key)?.sequence_length)
    }

    fn taxon(&self, key: &SequenceKey) -> Result<Taxon> {
        Ok(self.entry(key)?.taxon.clone())
    }

    fn in_clade(&self, key: &SequenceKey, clade: &str) -> Result<bool> {
        let entry = self.entry(key)?;
        Ok(lineage_contains(&entry.taxonomy, entry.organism.as_deref(), clade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_spans() {
        let data = b"header junk\nLOCUS a\nORIGIN\n//\nLOCUS b\n//";
        let spans = entry_spans(data);
        assert_eq!(spans.len(), 2);
        assert_eq!(&data[spans[0].0..spans[0].1], b"LOCUS a\nORIGIN\n//\n");
        assert_eq!(&data[spans[1].0..spans[1].1], b"LOCUS b\n//");
    }

    #[test]
    fn test_load_missing_index_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexedStore::open(dir.path()).err().unwrap();
        assert!(matches!(err, SumacError::Config(_)));
    }

    #[test]
    fn test_build_rejects_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GenbankIndex::build(dir.path(), false),
            Err(SumacError::Config(_))
        ));
    }
}

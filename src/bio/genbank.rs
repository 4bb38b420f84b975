/// GenBank flat-file records mapped onto `Sequence`
use crate::bio::sequence::Sequence;
use crate::SumacError;
use gb_io::reader::SeqReader;
use gb_io::seq::Seq;
use std::io::Read;

/// Convert a parsed GenBank entry; the key is accession.version when present.
pub fn record_from_seq(seq: Seq) -> Sequence {
    let id = seq
        .version
        .clone()
        .or_else(|| seq.accession.clone())
        .or_else(|| seq.name.clone())
        .unwrap_or_default();

    let (organism, taxonomy) = seq
        .source
        .as_ref()
        .and_then(|source| source.organism.as_deref())
        .map(split_organism_block)
        .unwrap_or((None, Vec::new()));

    let mut record = Sequence::new(id, seq.seq.to_ascii_uppercase()).with_taxonomy(taxonomy);
    if let Some(definition) = seq.definition.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        record = record.with_description(definition.trim_end_matches('.').to_string());
    }
    if let Some(organism) = organism {
        record = record.with_organism(organism);
    }
    record
}

/// The ORGANISM block holds the binomial on its first line and the
/// semicolon-separated lineage on the following lines.
fn split_organism_block(block: &str) -> (Option<String>, Vec<String>) {
    let mut lines = block.lines();
    let organism = lines
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let lineage_text = lines.map(str::trim).collect::<Vec<_>>().join(" ");
    let taxonomy = lineage_text
        .split(';')
        .map(|rank| rank.trim().trim_end_matches('.').trim())
        .filter(|rank| !rank.is_empty())
        .map(str::to_string)
        .collect();

    (organism, taxonomy)
}

/// Parse every entry from a GenBank stream
pub fn parse_genbank<R: Read>(reader: R) -> Result<Vec<Sequence>, SumacError> {
    SeqReader::new(reader)
        .map(|entry| {
            entry
                .map(record_from_seq)
                .map_err(|e| SumacError::Parse(format!("Failed to parse GenBank entry: {}", e)))
        })
        .collect()
}

/// Parse exactly one entry from a byte span of a flat file
pub fn parse_genbank_entry(bytes: &[u8]) -> Result<Sequence, SumacError> {
    let mut records = parse_genbank(bytes)?;
    match records.len() {
        1 => Ok(records.remove(0)),
        n => Err(SumacError::Parse(format!(
            "Expected one GenBank entry in span, found {}",
            n
        ))),
    }
}

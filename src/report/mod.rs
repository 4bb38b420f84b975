/// Per-region summaries of an assembled supermatrix

use crate::core::supermatrix::{AlignedBlock, Supermatrix};
use crate::Result;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color as TableColor, ContentArrangement, Table};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const CSV_FILE_NAME: &str = "gene_regions.csv";

const HEADER: [&str; 6] = [
    "Gene Region #",
    "Description",
    "# of OTUs",
    "Aligned Length",
    "Missing Data (%)",
    "Taxon Coverage Density",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    /// 1-based position of the region in the supermatrix
    pub region: usize,
    pub description: String,
    pub otus: usize,
    pub aligned_length: usize,
    /// Percentage of supermatrix taxa missing from this region, one decimal
    pub missing_data: f64,
    /// Fraction of supermatrix taxa present, two decimals
    pub coverage_density: f64,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl RegionSummary {
    pub fn new(region: usize, block: &AlignedBlock, total_taxa: usize) -> Self {
        let otus = block.len();
        let fraction = if total_taxa == 0 {
            0.0
        } else {
            otus as f64 / total_taxa as f64
        };
        Self {
            region,
            description: block.description().to_string(),
            otus,
            aligned_length: block.locus_length(),
            missing_data: round_to(100.0 - 100.0 * fraction, 1),
            coverage_density: round_to(fraction, 2),
        }
    }

    fn record(&self) -> [String; 6] {
        [
            self.region.to_string(),
            self.description.clone(),
            self.otus.to_string(),
            self.aligned_length.to_string(),
            format!("{:.1}", self.missing_data),
            format!("{:.2}", self.coverage_density),
        ]
    }
}

/// One summary per block, measured against the taxa of `matrix`
pub fn summarize(blocks: &[AlignedBlock], matrix: &Supermatrix) -> Vec<RegionSummary> {
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| RegionSummary::new(i + 1, block, matrix.taxa_count()))
        .collect()
}

pub fn write_csv<P: AsRef<Path>>(path: P, regions: &[RegionSummary]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to_writer(file, regions)
}

pub fn write_csv_to_writer<W: Write>(writer: W, regions: &[RegionSummary]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(csv_error)?;
    for region in regions {
        csv_writer.write_record(region.record()).map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn csv_error(err: csv::Error) -> crate::SumacError {
    crate::SumacError::Other(format!("CSV write failed: {}", err))
}

/// Console table of region summaries
pub fn region_table(regions: &[RegionSummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        HEADER
            .iter()
            .map(|title| Cell::new(title).add_attribute(Attribute::Bold).fg(TableColor::Cyan))
            .collect::<Vec<_>>(),
    );

    for region in regions {
        let [number, description, otus, length, missing, density] = region.record();
        table.add_row(vec![
            Cell::new(number),
            Cell::new(description),
            Cell::new(otus).set_alignment(CellAlignment::Right),
            Cell::new(length).set_alignment(CellAlignment::Right),
            Cell::new(missing).set_alignment(CellAlignment::Right),
            Cell::new(density).fg(TableColor::Green).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::sequence::Taxon;
    use crate::core::supermatrix::SupermatrixAssembler;

    fn block(description: &str, taxa: &[&str], length: usize) -> AlignedBlock {
        let mut block = AlignedBlock::new(description, length);
        for taxon in taxa {
            block.insert(Taxon::from(*taxon), vec![b'A'; length]);
        }
        block
    }

    #[test]
    fn test_missing_data_and_density() {
        let blocks = vec![
            block("rbcL", &["A a", "B b", "C c"], 10),
            block("matK", &["A a"], 4),
        ];
        let matrix = SupermatrixAssembler::concatenate(&blocks).unwrap();
        let regions = summarize(&blocks, &matrix);

        assert_eq!(regions[0].missing_data, 0.0);
        assert_eq!(regions[0].coverage_density, 1.0);
        assert_eq!(regions[1].region, 2);
        assert_eq!(regions[1].missing_data, 66.7);
        assert_eq!(regions[1].coverage_density, 0.33);
    }

    #[test]
    fn test_csv_layout() {
        let blocks = vec![block("rbcL gene, partial cds", &["A a", "B b"], 7)];
        let matrix = SupermatrixAssembler::concatenate(&blocks).unwrap();
        let mut buffer = Vec::new();
        write_csv_to_writer(&mut buffer, &summarize(&blocks, &matrix)).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Gene Region #,Description,# of OTUs,Aligned Length,Missing Data (%),Taxon Coverage Density"
        );
        assert_eq!(lines[1], "1,\"rbcL gene, partial cds\",2,7,0.0,1.00");
    }
}

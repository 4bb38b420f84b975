use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sumac::bio::sequence::Taxon;
use sumac::core::supermatrix::GAP;
use sumac::core::AlignedBlock;
use sumac::report;
use sumac::SupermatrixAssembler;

fn block(description: &str, length: usize, rows: &[(&str, &str)]) -> AlignedBlock {
    let mut block = AlignedBlock::new(description, length);
    for (taxon, row) in rows {
        assert!(block.insert(Taxon::from(*taxon), row.as_bytes().to_vec()));
    }
    block
}

fn row(matrix: &sumac::core::Supermatrix, taxon: &str) -> String {
    String::from_utf8(matrix.row(&Taxon::from(taxon)).unwrap().to_vec()).unwrap()
}

#[test]
fn test_missing_taxa_are_gap_padded() {
    let x1 = "ACGTACGTAC";
    let y1 = "TTTTTCCCCC";
    let y2 = "GGGAA";
    let z2 = "CCAAT";
    let blocks = vec![
        block("one", 10, &[("X x", x1), ("Y y", y1)]),
        block("two", 5, &[("Y y", y2), ("Z z", z2)]),
    ];

    let matrix = SupermatrixAssembler::concatenate(&blocks).unwrap();

    assert_eq!(matrix.length(), 15);
    assert_eq!(row(&matrix, "X x"), format!("{}-----", x1));
    assert_eq!(row(&matrix, "Y y"), format!("{}{}", y1, y2));
    assert_eq!(row(&matrix, "Z z"), format!("----------{}", z2));
    let taxa: Vec<&str> = matrix.taxa().map(Taxon::as_str).collect();
    assert_eq!(taxa, vec!["X x", "Y y", "Z z"]);
}

#[test]
fn test_incremental_assembly_matches_batch() {
    let blocks = vec![
        block("one", 3, &[("A a", "AAA")]),
        block("two", 2, &[("B b", "CC")]),
        block("three", 4, &[("A a", "GGGG"), ("C c", "TTTT")]),
    ];
    let mut assembler = SupermatrixAssembler::new();
    for b in &blocks {
        assembler.add_block(b).unwrap();
    }
    assert_eq!(assembler.blocks(), 3);
    let incremental = assembler.finish();
    assert_eq!(incremental, SupermatrixAssembler::concatenate(&blocks).unwrap());
    assert_eq!(row(&incremental, "B b"), "---CC----");
}

#[test]
fn test_final_fasta_and_regions() {
    let dir = tempfile::tempdir().unwrap();
    let blocks = vec![
        block("rbcL gene", 4, &[("Lythrum salicaria", "ACGT"), ("Cuphea viscosissima", "AC-T")]),
        block("matK gene", 2, &[("Lythrum salicaria", "GG")]),
    ];
    let matrix = SupermatrixAssembler::concatenate(&blocks).unwrap();
    let path = dir.path().join("final.fasta");
    matrix.write_fasta(&path, 80).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "> Lythrum salicaria\nACGTGG\n> Cuphea viscosissima\nAC-T--\n");

    let regions = report::summarize(&blocks, &matrix);
    assert_eq!(regions[1].otus, 1);
    assert_eq!(regions[1].aligned_length, 2);
    assert_eq!(regions[1].missing_data, 50.0);
    assert_eq!(regions[1].coverage_density, 0.5);
}

#[test]
fn test_blocks_from_aligned_fasta_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("0.fasta");
    let second = dir.path().join("1.fasta");
    std::fs::write(
        &first,
        ">AF1.1 Lythrum salicaria rbcL gene, partial cds\nACGT\n>AF2.1 Cuphea viscosissima rbcL gene, partial cds\nA-GT\n",
    )
    .unwrap();
    std::fs::write(&second, ">AF3.1 Cuphea viscosissima matK gene\nTT\n").unwrap();

    let blocks = vec![
        AlignedBlock::from_fasta(&first).unwrap(),
        AlignedBlock::from_fasta(&second).unwrap(),
    ];
    assert_eq!(blocks[0].description(), "rbcL gene, partial cds");

    let matrix = SupermatrixAssembler::concatenate(&blocks).unwrap();
    assert_eq!(row(&matrix, "Lythrum salicaria"), "ACGT--");
    assert_eq!(row(&matrix, "Cuphea viscosissima"), "A-GTTT");
}

fn arbitrary_blocks() -> impl Strategy<Value = Vec<AlignedBlock>> {
    let taxa = ["A a", "B b", "C c", "D d", "E e"];
    proptest::collection::vec(
        (0usize..12, proptest::sample::subsequence(taxa.to_vec(), 0..=taxa.len())),
        0..6,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (length, present))| {
                let mut block = AlignedBlock::new(format!("locus {}", i), length);
                for taxon in present {
                    block.insert(Taxon::from(taxon), vec![b'A' + (i as u8 % 4); length]);
                }
                block
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_rows_have_total_length(blocks in arbitrary_blocks()) {
        let matrix = SupermatrixAssembler::concatenate(&blocks).unwrap();
        let total: usize = blocks.iter().map(AlignedBlock::locus_length).sum();

        prop_assert_eq!(matrix.length(), total);
        for (taxon, row) in matrix.rows() {
            prop_assert_eq!(row.len(), total);

            // Each block's slice is either the taxon's row or all gaps
            let mut offset = 0;
            for block in &blocks {
                let slice = &row[offset..offset + block.locus_length()];
                match block.rows().find(|(t, _)| *t == taxon) {
                    Some((_, expected)) => prop_assert_eq!(slice, expected),
                    None => prop_assert!(slice.iter().all(|&b| b == GAP)),
                }
                offset += block.locus_length();
            }
        }
    }
}

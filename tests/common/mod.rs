//! Shared fixtures for the integration tests
#![allow(dead_code)]

use sumac::bio::sequence::{Sequence, SequenceKey};
use sumac::storage::MemoryStore;

pub const LYTHRACEAE: &[&str] = &[
    "Eukaryota",
    "Viridiplantae",
    "Streptophyta",
    "Magnoliopsida",
    "Myrtales",
    "Lythraceae",
];

pub const ONAGRACEAE: &[&str] = &[
    "Eukaryota",
    "Viridiplantae",
    "Streptophyta",
    "Magnoliopsida",
    "Myrtales",
    "Onagraceae",
];

/// A record with organism, lineage and a `<organism> <gene> gene` definition line
pub fn record(id: &str, organism: &str, lineage: &[&str], gene: &str, len: usize) -> Sequence {
    Sequence::new(id.to_string(), vec![b'A'; len])
        .with_description(format!("{} {} gene", organism, gene))
        .with_organism(organism.to_string())
        .with_taxonomy(lineage.iter().map(|rank| rank.to_string()).collect())
}

/// A bare record of the given length
pub fn plain(id: &str, len: usize) -> Sequence {
    Sequence::new(id.to_string(), vec![b'A'; len])
}

pub fn keys(ids: &[&str]) -> Vec<SequenceKey> {
    ids.iter().map(|id| SequenceKey::from(*id)).collect()
}

pub fn store(records: Vec<Sequence>) -> MemoryStore {
    MemoryStore::from_sequences(records).expect("unique test keys")
}

/// Five Lythraceae/Onagraceae taxa sampled for rbcL, four for matK and one
/// Punica record that clusters with nothing.
pub fn myrtales_store() -> MemoryStore {
    store(vec![
        record("r1", "Lythrum salicaria", LYTHRACEAE, "rbcL", 100),
        record("r2", "Cuphea viscosissima", LYTHRACEAE, "rbcL", 101),
        record("r3", "Lagerstroemia indica", LYTHRACEAE, "rbcL", 102),
        record("m1", "Lythrum salicaria", LYTHRACEAE, "matK", 200),
        record("m2", "Cuphea viscosissima", LYTHRACEAE, "matK", 201),
        record("p1", "Punica granatum", LYTHRACEAE, "ITS", 50),
        record("r4", "Oenothera biennis", ONAGRACEAE, "rbcL", 103),
        record("r5", "Fuchsia magellanica", ONAGRACEAE, "rbcL", 104),
        record("m3", "Oenothera biennis", ONAGRACEAE, "matK", 202),
        record("m4", "Fuchsia magellanica", ONAGRACEAE, "matK", 203),
    ])
}

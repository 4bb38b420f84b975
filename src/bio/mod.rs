pub mod fasta;
pub mod genbank;
pub mod sequence;

pub use sequence::{Sequence, SequenceKey, Taxon};

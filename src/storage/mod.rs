pub mod index;
pub mod memory;
pub mod traits;

pub use index::{GenbankIndex, IndexedStore, INDEX_FILE_NAME};
pub use memory::MemoryStore;
pub use traits::SequenceStore;

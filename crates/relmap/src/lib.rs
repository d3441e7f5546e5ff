mod read_ahead;
pub use read_ahead::{ReadAheadCache, ReadAheadMap};

pub mod relation;
pub use relation::{RelationChangeSet, RelationPair, RelationTracker};

mod store;
pub use store::Store;

mod writer;
pub use writer::BatchRelationWriter;

pub use relmap_core::{Config, Connection, Error, Result, Schema};

mod change_set;
pub use change_set::RelationChangeSet;

mod pair;
pub use pair::RelationPair;

mod tracker;
pub use tracker::RelationTracker;

mod alias;
pub use alias::AliasSource;

mod cache;
pub use cache::StatementCache;

pub mod serializer;
pub use serializer::Serializer;

pub mod stmt;
pub use stmt::StatementBuilder;

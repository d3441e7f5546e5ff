/// Identifies a generated statement in the [`StatementCache`].
///
/// [`StatementCache`]: crate::StatementCache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    PrimaryKey { entity: String, eager: bool },
    FindAll { entity: String, distinct: bool },
    FindByField {
        entity: String,
        finder: String,
        distinct: bool,
    },
    Relation { entity: String, field: String },
    InsertEntity { entity: String },
    DeleteEntity { entity: String },
    InsertRelation { relation: String },
    DeleteRelations { relation: String, count: usize },
    /// A compiled query, registered under a caller-chosen name
    Named { entity: String, name: String },
}

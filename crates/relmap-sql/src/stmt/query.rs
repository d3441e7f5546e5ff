use super::{param, Bound, QueryParameter};

use relmap_core::{
    schema::{db, EntityId, RoleId},
    stmt::{self, Param, Value},
    Result, Schema,
};

/// A generated statement together with everything needed to run it and
/// interpret its rows.
#[derive(Debug, Clone)]
pub struct Query {
    pub sql: String,

    /// Parameter descriptors, in placeholder order
    pub params: Vec<QueryParameter>,

    /// Storage type of each result column, in select-list order
    pub columns: Vec<db::Type>,

    /// What each result row produces
    pub select: Select,

    /// Rows to skip before the first returned row
    pub offset: Option<Bound>,

    /// Maximum number of rows returned
    pub limit: Option<Bound>,

    /// Table the statement is issued against
    pub table: String,
}

/// Shape of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Select {
    /// The statement returns no rows
    None,

    /// Entity identities, possibly followed by preloaded fields
    Entity(EntitySelect),

    /// A single field of an entity
    Field { entity: EntityId, field: usize },

    /// One value computed by the database, such as an aggregate
    Function(stmt::Type),
}

/// Row layout of an entity select.
///
/// Columns appear in this order: the entity's primary key columns, the
/// columns of each field in `eager`, then the columns of each left join in
/// declaration order, depth first.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySelect {
    pub entity: EntityId,

    /// Indices of the fields preloaded with each row
    pub eager: Vec<usize>,

    pub left_joins: Vec<JoinNode>,
}

/// A related entity fetched through a `LEFT OUTER JOIN`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
    /// Relation field on the parent entity
    pub field: String,

    /// The parent's role in the relation
    pub role: RoleId,

    /// The related entity
    pub entity: EntityId,

    pub eager: Vec<usize>,

    pub left_joins: Vec<JoinNode>,
}

impl Query {
    /// Binds the call arguments to the statement's placeholders.
    pub fn bind(&self, args: &[Value]) -> Result<Vec<Param>> {
        param::bind_all(&self.params, args)
    }

    pub fn is_select(&self) -> bool {
        !matches!(self.select, Select::None)
    }

    /// Resolves the offset, defaulting to zero.
    pub fn offset(&self, args: &[Value]) -> Result<u64> {
        match &self.offset {
            Some(bound) => bound.resolve(args),
            None => Ok(0),
        }
    }

    /// Resolves the limit. `None` means unlimited, and so does a limit of 0.
    pub fn limit(&self, args: &[Value]) -> Result<Option<u64>> {
        let limit = self.limit.as_ref().map(|bound| bound.resolve(args)).transpose()?;
        Ok(limit.filter(|&limit| limit > 0))
    }
}

impl EntitySelect {
    /// Number of result columns this select reads per row.
    pub fn width(&self, schema: &Schema) -> usize {
        row_width(schema, self.entity, &self.eager, &self.left_joins)
    }
}

impl JoinNode {
    pub fn width(&self, schema: &Schema) -> usize {
        row_width(schema, self.entity, &self.eager, &self.left_joins)
    }
}

fn row_width(schema: &Schema, entity: EntityId, eager: &[usize], left_joins: &[JoinNode]) -> usize {
    let entity = schema.entity(entity);

    let eager_width: usize = eager
        .iter()
        .map(|&field| entity.fields[field].mapping.width())
        .sum();
    let joins_width: usize = left_joins.iter().map(|join| join.width(schema)).sum();

    entity.primary_key_columns() + eager_width + joins_width
}

mod ddl;
mod dml;
mod finder;
mod select;

use super::{Query, QueryKey, QueryParameter, Select};
use crate::{serializer::Serializer, AliasSource};

use relmap_core::{
    driver::Capability,
    mapping::Column,
    schema::{Entity, JoinTable, Relation},
    Config, Error, Result, Schema,
};

/// Generates SQL statements from entity and relation metadata.
///
/// Every statement gets a fresh [`AliasSource`], so generation is
/// deterministic and a builder can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    schema: &'a Schema,
    config: &'a Config,
    capability: &'static Capability,
    serializer: Serializer,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(schema: &'a Schema, config: &'a Config) -> StatementBuilder<'a> {
        StatementBuilder {
            schema,
            config,
            capability: Capability::for_flavor(config.flavor),
            serializer: Serializer::new(config.flavor),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    /// Builds the statement identified by `key`.
    ///
    /// Named compiled queries are not known to the builder; build those with
    /// [`compiled`](Self::compiled).
    pub fn build(&self, key: &QueryKey) -> Result<Query> {
        match key {
            QueryKey::PrimaryKey { entity, eager } => self.find_by_primary_key(entity, *eager),
            QueryKey::FindAll { entity, distinct } => self.find_all(entity, *distinct),
            QueryKey::FindByField {
                entity,
                finder,
                distinct,
            } => self.find_by_field(entity, finder, *distinct),
            QueryKey::Relation { entity, field } => self.load_relation(entity, field),
            QueryKey::InsertEntity { entity } => self.insert_entity(entity),
            QueryKey::DeleteEntity { entity } => self.delete_entity(entity),
            QueryKey::InsertRelation { relation } => self.insert_relation(relation),
            QueryKey::DeleteRelations { relation, count } => {
                self.delete_relations(relation, *count)
            }
            QueryKey::Named { entity, name } => Err(Error::query_build(format!(
                "no compiled query `{name}` registered for entity `{entity}`"
            ))),
        }
    }

    fn aliases(&self) -> AliasSource {
        AliasSource::new(&self.config.alias)
    }

    fn entity(&self, name: &str) -> Result<&'a Entity> {
        self.schema
            .entity_by_name(name)
            .ok_or_else(|| Error::query_build(format!("unknown entity `{name}`")))
    }

    fn relation(&self, name: &str) -> Result<&'a Relation> {
        self.schema
            .relation_by_name(name)
            .ok_or_else(|| Error::query_build(format!("unknown relation `{name}`")))
    }
}

/// The primary key columns of `entity`, flattened in key order.
fn key_columns(entity: &Entity) -> impl Iterator<Item = &Column> + '_ {
    entity
        .primary_key_fields()
        .flat_map(|field| field.mapping.columns())
}

/// The columns of the given fields, flattened in order.
fn field_columns<'e>(entity: &'e Entity, fields: &'e [usize]) -> impl Iterator<Item = &'e Column> {
    fields
        .iter()
        .flat_map(move |&field| entity.fields[field].mapping.columns())
}

/// One parameter per primary key column of `entity`, reading argument `arg`
/// as an identity.
fn key_params(entity: &Entity, arg: usize) -> Vec<QueryParameter> {
    let width = entity.primary_key_width();

    entity
        .primary_key_fields()
        .enumerate()
        .flat_map(|(index, field)| {
            (0..field.mapping.width()).map(move |column| {
                QueryParameter::new(arg, column, field.mapping.clone()).identity(index, width)
            })
        })
        .collect()
}

fn join_table(relation: &Relation) -> Result<&JoinTable> {
    relation.join_table().ok_or_else(|| {
        Error::query_build(format!(
            "relation `{}` is not mapped to a relation table",
            relation.name
        ))
    })
}

/// A statement that returns no rows.
fn statement(sql: String, params: Vec<QueryParameter>, table: &str) -> Query {
    log::trace!("built statement on `{table}`: {sql}");

    Query {
        sql,
        params,
        columns: vec![],
        select: Select::None,
        offset: None,
        limit: None,
        table: table.to_string(),
    }
}

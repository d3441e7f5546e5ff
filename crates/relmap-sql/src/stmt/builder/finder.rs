use super::{key_columns, key_params, select::SelectBuilder, StatementBuilder};
use crate::{
    serializer::Bind,
    stmt::{
        compiled::{parse_template, TemplatePart},
        CompiledParam, CompiledQuery, CompiledSelect, EntitySelect, Query, QueryParameter, Select,
    },
};

use relmap_core::{
    mapping::{Column, ColumnMapping},
    schema::{db, Entity, RelationMapping, Strategy},
    stmt, Error, Result,
};

use std::sync::Arc;

const FINDER_PREFIX: &str = "findBy";

impl StatementBuilder<'_> {
    /// Selects one entity by identity. The identity is argument 0.
    ///
    /// With `eager`, the entity's eager load group and read-ahead left joins
    /// are selected as well, and the rows are locked when row locking is
    /// enabled for the entity or globally.
    pub fn find_by_primary_key(&self, entity: &str, eager: bool) -> Result<Query> {
        let entity = self.entity(entity)?;
        let lock = eager && (self.config.row_locking || entity.row_locking);

        let mut select = SelectBuilder::new(self);
        let alias = select.aliases.alias(&entity.name);
        select.from(&entity.table, &alias);

        let entity_select = self.select_entity(&mut select, entity, &alias, eager)?;
        select.filter(&alias, key_columns(entity), key_params(entity, 0));

        select.build(Select::Entity(entity_select), lock)
    }

    /// Selects every entity. Eager fields are included when the entity reads
    /// ahead on find.
    pub fn find_all(&self, entity: &str, distinct: bool) -> Result<Query> {
        let entity = self.entity(entity)?;

        let mut select = SelectBuilder::new(self);
        select.distinct(distinct);
        let alias = select.aliases.alias(&entity.name);
        select.from(&entity.table, &alias);

        let entity_select =
            self.select_entity(&mut select, entity, &alias, reads_ahead_on_find(entity))?;

        select.build(Select::Entity(entity_select), false)
    }

    /// Selects entities by the value of one field, named by a finder such as
    /// `findByEmail`. The field value is argument 0.
    pub fn find_by_field(&self, entity: &str, finder: &str, distinct: bool) -> Result<Query> {
        let entity = self.entity(entity)?;
        let index = finder_field(entity, finder)?;
        let field = &entity.fields[index];

        let mut select = SelectBuilder::new(self);
        select.distinct(distinct);
        let alias = select.aliases.alias(&entity.name);
        select.from(&entity.table, &alias);

        let entity_select =
            self.select_entity(&mut select, entity, &alias, reads_ahead_on_find(entity))?;

        let params = (0..field.mapping.width())
            .map(|column| QueryParameter::new(0, column, field.mapping.clone()))
            .collect();
        select.filter(&alias, field.mapping.columns(), params);

        select.build(Select::Entity(entity_select), false)
    }

    /// Selects the entities related to one instance through a relation
    /// field. The instance's identity is argument 0.
    pub fn load_relation(&self, entity: &str, field: &str) -> Result<Query> {
        let entity = self.entity(entity)?;
        let relation_field = entity.relation_field(field).ok_or_else(|| {
            Error::query_build(format!(
                "unknown relation field `{field}` on entity `{}`",
                entity.name
            ))
        })?;

        let role = relation_field.role;
        let relation = self.schema.relation(role.relation);
        let related = self.schema.entity(self.schema.related_role(role).entity);

        let path = format!("{}.{field}", entity.name);

        let mut select = SelectBuilder::new(self);
        let related_alias = select.aliases.alias(&path);
        select.from(&related.table, &related_alias);

        let eager = if reads_ahead_on_find(related) {
            related.eager_fields()?.to_vec()
        } else {
            vec![]
        };
        select.entity_columns(related, &related_alias, &eager);

        match &relation.mapping {
            RelationMapping::ForeignKey(fk) if fk.side == role.side => {
                // Our table holds the key referencing the related entity
                let alias = select.aliases.alias(&entity.name);
                select.inner_join(
                    &entity.table,
                    &alias,
                    &related_alias,
                    key_columns(related),
                    fk.fields
                        .iter()
                        .flat_map(|&field| entity.fields[field].mapping.columns()),
                );
                select.filter(&alias, key_columns(entity), key_params(entity, 0));
            }
            RelationMapping::ForeignKey(fk) => {
                let columns = fk
                    .fields
                    .iter()
                    .flat_map(|&field| related.fields[field].mapping.columns());
                select.filter(&related_alias, columns, key_params(entity, 0));
            }
            RelationMapping::Table(join_table) => {
                let alias = select.aliases.relation_alias(&path);
                select.inner_join(
                    &join_table.table,
                    &alias,
                    &related_alias,
                    key_columns(related),
                    join_table.columns(role.side.other()),
                );
                select.filter(
                    &alias,
                    join_table.columns(role.side),
                    key_params(entity, 0),
                );
            }
        }

        let entity_select = EntitySelect {
            entity: related.id,
            eager,
            left_joins: vec![],
        };

        select.build(Select::Entity(entity_select), false)
    }

    /// Wraps a compiled query. The SQL text is kept as is; the builder
    /// resolves parameters and the row layout against the schema.
    pub fn compiled(&self, query: &CompiledQuery) -> Result<Query> {
        let (select, columns, table) = self.compiled_select(&query.select, query.distinct)?;

        let params = query
            .params
            .iter()
            .map(|param| self.compiled_param(param))
            .collect::<Result<Vec<_>>>()?;

        Ok(Query {
            sql: query.sql.clone(),
            params,
            columns,
            select,
            offset: query.offset,
            limit: query.limit,
            table,
        })
    }

    /// Builds a query from declared SQL, where `{n}` marks argument `n`.
    /// `arg_types` gives the type of each argument.
    pub fn declared(
        &self,
        template: &str,
        select: &CompiledSelect,
        arg_types: &[stmt::Type],
    ) -> Result<Query> {
        let (select, columns, table) = self.compiled_select(select, false)?;

        let mut sql = String::new();
        let mut params: Vec<QueryParameter> = vec![];

        for part in parse_template(template)? {
            match part {
                TemplatePart::Text(text) => sql.push_str(text),
                TemplatePart::Arg(arg) => {
                    let ty = arg_types.get(arg).ok_or_else(|| {
                        Error::query_build(format!(
                            "declared SQL references argument {arg} but only {} are declared",
                            arg_types.len()
                        ))
                    })?;
                    let param = QueryParameter::new(arg, 0, value_mapping(ty)?);
                    sql.push_str(&self.serializer.serialize(&mut params, Bind(param)));
                }
            }
        }

        Ok(Query {
            sql,
            params,
            columns,
            select,
            offset: None,
            limit: None,
            table,
        })
    }

    /// Appends the entity's key and eager columns, and with `eager` its
    /// read-ahead left joins.
    fn select_entity(
        &self,
        select: &mut SelectBuilder<'_, '_>,
        entity: &Entity,
        alias: &str,
        eager: bool,
    ) -> Result<EntitySelect> {
        if !eager {
            select.entity_columns(entity, alias, &[]);
            return Ok(EntitySelect {
                entity: entity.id,
                eager: vec![],
                left_joins: vec![],
            });
        }

        let eager = select.eager_fields(entity, entity.eager_fields()?);
        select.entity_columns(entity, alias, &eager);
        let left_joins =
            select.left_joins(entity, alias, &entity.name, &entity.read_ahead.left_joins)?;

        Ok(EntitySelect {
            entity: entity.id,
            eager,
            left_joins,
        })
    }

    fn compiled_select(
        &self,
        select: &CompiledSelect,
        distinct: bool,
    ) -> Result<(Select, Vec<db::Type>, String)> {
        match select {
            CompiledSelect::Entity {
                entity,
                eager_load_group,
            } => {
                let entity = self.entity(entity)?;
                let eager: Vec<usize> = match eager_load_group {
                    Some(group) => entity
                        .load_group(group)?
                        .iter()
                        .copied()
                        .filter(|&field| !distinct || entity.fields[field].is_searchable())
                        .collect(),
                    None => vec![],
                };

                let columns = key_columns(entity)
                    .chain(
                        eager
                            .iter()
                            .flat_map(|&field| entity.fields[field].mapping.columns()),
                    )
                    .map(|column| column.storage_ty.clone())
                    .collect();

                let select = Select::Entity(EntitySelect {
                    entity: entity.id,
                    eager,
                    left_joins: vec![],
                });
                Ok((select, columns, entity.table.clone()))
            }
            CompiledSelect::Field { entity, field } => {
                let entity = self.entity(entity)?;
                let index = field_index(entity, field)?;
                let columns = entity.fields[index].mapping.storage_types().cloned().collect();
                let select = Select::Field {
                    entity: entity.id,
                    field: index,
                };
                Ok((select, columns, entity.table.clone()))
            }
            CompiledSelect::Function(ty) => Ok((
                Select::Function(ty.clone()),
                vec![db::Type::from_app(ty)?],
                String::new(),
            )),
        }
    }

    fn compiled_param(&self, param: &CompiledParam) -> Result<QueryParameter> {
        match param {
            CompiledParam::Field {
                arg,
                entity,
                field,
                column,
            } => {
                let entity = self.entity(entity)?;
                let mapping = &entity.fields[field_index(entity, field)?].mapping;
                if *column >= mapping.width() {
                    return Err(Error::query_build(format!(
                        "field `{}.{field}` has no column {column}",
                        entity.name
                    )));
                }
                Ok(QueryParameter::new(*arg, *column, mapping.clone()))
            }
            CompiledParam::Identity {
                arg,
                entity,
                column,
            } => {
                let entity = self.entity(entity)?;
                key_params(entity, *arg)
                    .into_iter()
                    .nth(*column)
                    .ok_or_else(|| {
                        Error::query_build(format!(
                            "primary key of `{}` has no column {column}",
                            entity.name
                        ))
                    })
            }
            CompiledParam::Value { arg, ty } => {
                Ok(QueryParameter::new(*arg, 0, value_mapping(ty)?))
            }
        }
    }
}

fn reads_ahead_on_find(entity: &Entity) -> bool {
    entity.read_ahead.strategy == Strategy::OnFind
}

fn field_index(entity: &Entity, field: &str) -> Result<usize> {
    entity.field_index(field).ok_or_else(|| {
        Error::query_build(format!(
            "unknown field `{field}` on entity `{}`",
            entity.name
        ))
    })
}

/// Resolves a finder name to the field it searches.
fn finder_field(entity: &Entity, finder: &str) -> Result<usize> {
    let name = finder
        .strip_prefix(FINDER_PREFIX)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::query_build(format!(
                "finder `{finder}` on entity `{}` does not start with `{FINDER_PREFIX}`",
                entity.name
            ))
        })?;

    let mut chars = name.chars();
    let field_name: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    };

    let index = entity.field_index(&field_name).ok_or_else(|| {
        Error::query_build(format!(
            "finder `{finder}` refers to unknown field `{field_name}` on entity `{}`",
            entity.name
        ))
    })?;

    if !entity.fields[index].is_searchable() {
        return Err(Error::query_build(format!(
            "finder `{finder}`: field `{field_name}` on entity `{}` is not searchable",
            entity.name
        )));
    }

    Ok(index)
}

/// Mapping for a plain argument of type `ty`.
fn value_mapping(ty: &stmt::Type) -> Result<Arc<ColumnMapping>> {
    let column = Column::with_storage("?", ty.clone(), db::Type::from_app(ty)?);
    Ok(Arc::new(ColumnMapping::simple(column)))
}

use super::{field_columns, key_columns, StatementBuilder};
use crate::{
    serializer::{ColumnRef, Comma, Compare, Delimited},
    stmt::{JoinNode, Query, QueryParameter, Select},
    AliasSource,
};

use relmap_core::{
    mapping::Column,
    schema::{db, Entity, LeftJoin, RelationMapping},
    Error, Result,
};

/// Accumulates the pieces of one `SELECT` statement.
pub(super) struct SelectBuilder<'a, 'b> {
    builder: &'b StatementBuilder<'a>,

    pub(super) aliases: AliasSource,

    distinct: bool,

    /// (alias, column) pairs of the select list
    columns: Vec<(String, String)>,

    column_types: Vec<db::Type>,

    /// Root table and its alias
    from: Option<(String, String)>,

    joins: Vec<Join>,

    filters: Vec<Filter>,
}

struct Join {
    kind: &'static str,
    table: String,
    alias: String,

    /// (left alias, left column, right alias, right column)
    on: Vec<(String, String, String, String)>,
}

struct Filter {
    alias: String,
    column: String,
    param: QueryParameter,
}

impl<'a, 'b> SelectBuilder<'a, 'b> {
    pub(super) fn new(builder: &'b StatementBuilder<'a>) -> SelectBuilder<'a, 'b> {
        SelectBuilder {
            builder,
            aliases: builder.aliases(),
            distinct: false,
            columns: vec![],
            column_types: vec![],
            from: None,
            joins: vec![],
            filters: vec![],
        }
    }

    pub(super) fn distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    pub(super) fn from(&mut self, table: &str, alias: &str) {
        self.from = Some((table.to_string(), alias.to_string()));
    }

    /// Appends the primary key columns followed by the columns of `eager`.
    pub(super) fn entity_columns(&mut self, entity: &Entity, alias: &str, eager: &[usize]) {
        for column in key_columns(entity).chain(field_columns(entity, eager)) {
            self.column(alias, column);
        }
    }

    fn column(&mut self, alias: &str, column: &Column) {
        self.columns.push((alias.to_string(), column.name.clone()));
        self.column_types.push(column.storage_ty.clone());
    }

    /// Adds `alias.column = ?` for every column and parameter pair.
    pub(super) fn filter<'c>(
        &mut self,
        alias: &str,
        columns: impl IntoIterator<Item = &'c Column>,
        params: Vec<QueryParameter>,
    ) {
        for (column, param) in columns.into_iter().zip(params) {
            self.filters.push(Filter {
                alias: alias.to_string(),
                column: column.name.clone(),
                param,
            });
        }
    }

    /// Adds an `INNER JOIN` of `table` on the paired columns.
    pub(super) fn inner_join<'c>(
        &mut self,
        table: &str,
        alias: &str,
        left_alias: &str,
        left: impl IntoIterator<Item = &'c Column>,
        right: impl IntoIterator<Item = &'c Column>,
    ) {
        self.join("INNER JOIN", table, alias, left_alias, left, right);
    }

    fn join<'c>(
        &mut self,
        kind: &'static str,
        table: &str,
        alias: &str,
        left_alias: &str,
        left: impl IntoIterator<Item = &'c Column>,
        right: impl IntoIterator<Item = &'c Column>,
    ) {
        let on = left
            .into_iter()
            .zip(right)
            .map(|(l, r)| {
                (
                    left_alias.to_string(),
                    l.name.clone(),
                    alias.to_string(),
                    r.name.clone(),
                )
            })
            .collect();

        self.joins.push(Join {
            kind,
            table: table.to_string(),
            alias: alias.to_string(),
            on,
        });
    }

    /// Adds the `LEFT OUTER JOIN`s and select columns for the read-ahead
    /// relations of `entity`, recursively.
    pub(super) fn left_joins(
        &mut self,
        entity: &Entity,
        alias: &str,
        path: &str,
        left_joins: &[LeftJoin],
    ) -> Result<Vec<JoinNode>> {
        let schema = self.builder.schema;
        let mut nodes = vec![];

        for left_join in left_joins {
            let field = entity.relation_field(&left_join.field).ok_or_else(|| {
                Error::query_build(format!(
                    "unknown relation field `{}` on entity `{}` in left join",
                    left_join.field, entity.name
                ))
            })?;

            let relation = schema.relation(field.role.relation);
            let related = schema.entity(schema.related_role(field.role).entity);

            let join_path = format!("{path}.{}", left_join.field);
            let related_alias = self.aliases.alias(&join_path);

            match &relation.mapping {
                RelationMapping::ForeignKey(fk) if fk.side == field.role.side => {
                    // The parent's table holds the key columns
                    self.join(
                        "LEFT OUTER JOIN",
                        &related.table,
                        &related_alias,
                        alias,
                        field_columns(entity, &fk.fields),
                        key_columns(related),
                    );
                }
                RelationMapping::ForeignKey(fk) => {
                    self.join(
                        "LEFT OUTER JOIN",
                        &related.table,
                        &related_alias,
                        alias,
                        key_columns(entity),
                        field_columns(related, &fk.fields),
                    );
                }
                RelationMapping::Table(join_table) => {
                    let relation_alias = self.aliases.relation_alias(&join_path);
                    self.join(
                        "LEFT OUTER JOIN",
                        &join_table.table,
                        &relation_alias,
                        alias,
                        key_columns(entity),
                        join_table.columns(field.role.side),
                    );
                    self.join(
                        "LEFT OUTER JOIN",
                        &related.table,
                        &related_alias,
                        &relation_alias,
                        join_table.columns(field.role.side.other()),
                        key_columns(related),
                    );
                }
            }

            let eager = match &left_join.eager_load_group {
                Some(group) => self.eager_fields(related, related.load_group(group)?),
                None => vec![],
            };

            self.entity_columns(related, &related_alias, &eager);
            let children =
                self.left_joins(related, &related_alias, &join_path, &left_join.left_joins)?;

            nodes.push(JoinNode {
                field: left_join.field.clone(),
                role: field.role,
                entity: related.id,
                eager,
                left_joins: children,
            });
        }

        Ok(nodes)
    }

    /// Drops fields that cannot appear in a `DISTINCT` select list.
    pub(super) fn eager_fields(&self, entity: &Entity, fields: &[usize]) -> Vec<usize> {
        fields
            .iter()
            .copied()
            .filter(|&field| !self.distinct || entity.fields[field].is_searchable())
            .collect()
    }

    /// Serializes the statement. With `lock`, the flavor's row locking
    /// template is used when it has one.
    pub(super) fn build(self, select: Select, lock: bool) -> Result<Query> {
        let SelectBuilder {
            builder,
            distinct,
            columns,
            column_types,
            from,
            joins,
            filters,
            ..
        } = self;

        let Some((table, root_alias)) = from else {
            return Err(Error::query_build("select statement has no FROM table"));
        };

        let serializer = &builder.serializer;
        let mut params: Vec<QueryParameter> = vec![];

        let select_list = serializer.serialize(
            &mut params,
            Comma(
                columns
                    .iter()
                    .map(|(alias, name)| ColumnRef::new(alias, name)),
            ),
        );

        let mut from = format!("{table} {root_alias}");
        for join in &joins {
            let on = serializer.serialize(
                &mut params,
                Delimited(
                    join.on.iter().map(|(la, lc, ra, rc)| {
                        (ColumnRef::new(la, lc), ColumnRef::new(ra, rc))
                    }),
                    " AND ",
                ),
            );
            from.push_str(&format!(" {} {} {} ON {on}", join.kind, join.table, join.alias));
        }

        let filter = serializer.serialize(
            &mut params,
            Delimited(
                filters.iter().map(|filter| Compare {
                    column: ColumnRef::new(&filter.alias, &filter.column),
                    param: filter.param.clone(),
                }),
                " AND ",
            ),
        );

        let capability = builder.capability;
        let locked = if lock && !filter.is_empty() {
            let sql = capability.row_locking_select(&select_list, &from, &filter);
            if sql.is_none() {
                log::debug!(
                    "{:?} has no row locking template; using a plain select on `{table}`",
                    capability.flavor
                );
            }
            sql
        } else {
            None
        };

        let sql = match locked {
            Some(sql) => sql,
            None => {
                let mut sql = String::from("SELECT ");
                if distinct {
                    sql.push_str("DISTINCT ");
                }
                sql.push_str(&select_list);
                sql.push_str(" FROM ");
                sql.push_str(&from);
                if !filter.is_empty() {
                    sql.push_str(" WHERE ");
                    sql.push_str(&filter);
                }
                sql
            }
        };

        log::trace!("built select on `{table}`: {sql}");

        Ok(Query {
            sql,
            params,
            columns: column_types,
            select,
            offset: None,
            limit: None,
            table,
        })
    }
}

use super::{join_table, key_columns, key_params, statement, StatementBuilder};
use crate::{
    serializer::{Bind, ColumnRef, Comma, Compare, Delimited, Paren},
    stmt::{Query, QueryParameter},
};

use relmap_core::{
    mapping::Column,
    schema::{Entity, Relation},
    Error, Result,
};

impl StatementBuilder<'_> {
    /// Inserts one entity. Argument 0 is the entity record, one value per
    /// field in declaration order. Auto-increment columns are left to the
    /// database.
    pub fn insert_entity(&self, entity: &str) -> Result<Query> {
        let entity = self.entity(entity)?;

        let mut columns = vec![];
        let mut values = vec![];

        for (index, field) in entity.fields.iter().enumerate() {
            for (position, column) in field.mapping.columns().iter().enumerate() {
                if column.auto_increment {
                    continue;
                }
                columns.push(column.name.as_str());
                values.push(QueryParameter::new(0, position, field.mapping.clone()).field(index));
            }
        }

        Ok(self.insert(&entity.table, columns, values))
    }

    /// Deletes one entity by identity, given as argument 0.
    pub fn delete_entity(&self, entity: &str) -> Result<Query> {
        let entity = self.entity(entity)?;

        let mut params: Vec<QueryParameter> = vec![];
        let filter = self.serializer.serialize(
            &mut params,
            Delimited(key_filter(key_columns(entity), key_params(entity, 0)), " AND "),
        );

        Ok(statement(
            format!("DELETE FROM {} WHERE {filter}", entity.table),
            params,
            &entity.table,
        ))
    }

    /// Inserts one association row. Argument 0 is the left identity and
    /// argument 1 the right identity.
    pub fn insert_relation(&self, relation: &str) -> Result<Query> {
        let relation = self.relation(relation)?;
        let join_table = join_table(relation)?;
        let (left, right) = self.role_entities(relation);

        let columns = join_table
            .left
            .iter()
            .chain(&join_table.right)
            .map(|column| column.name.as_str())
            .collect();

        let mut values = key_params(left, 0);
        values.extend(key_params(right, 1));

        Ok(self.insert(&join_table.table, columns, values))
    }

    /// Deletes `count` association rows in one statement. Pair `n` is read
    /// from arguments `2n` (left identity) and `2n + 1` (right identity).
    pub fn delete_relations(&self, relation: &str, count: usize) -> Result<Query> {
        let relation = self.relation(relation)?;
        let join_table = join_table(relation)?;
        let (left, right) = self.role_entities(relation);

        if count == 0 {
            return Err(Error::query_build(format!(
                "cannot delete zero rows from relation table `{}`",
                join_table.table
            )));
        }

        let mut params: Vec<QueryParameter> = vec![];
        let pairs = (0..count).map(|pair| {
            Paren(Delimited(
                key_filter(&join_table.left, key_params(left, 2 * pair)).chain(key_filter(
                    &join_table.right,
                    key_params(right, 2 * pair + 1),
                )),
                " AND ",
            ))
        });

        let filter = self
            .serializer
            .serialize(&mut params, Delimited(pairs, " OR "));

        Ok(statement(
            format!("DELETE FROM {} WHERE {filter}", join_table.table),
            params,
            &join_table.table,
        ))
    }

    fn insert(&self, table: &str, columns: Vec<&str>, values: Vec<QueryParameter>) -> Query {
        let mut params: Vec<QueryParameter> = vec![];
        let values = self
            .serializer
            .serialize(&mut params, Comma(values.into_iter().map(Bind)));

        statement(
            format!("INSERT INTO {table} ({}) VALUES ({values})", columns.join(", ")),
            params,
            table,
        )
    }

    fn role_entities(&self, relation: &Relation) -> (&Entity, &Entity) {
        (
            self.schema.entity(relation.left.entity),
            self.schema.entity(relation.right.entity),
        )
    }
}

fn key_filter<'c>(
    columns: impl IntoIterator<Item = &'c Column>,
    params: Vec<QueryParameter>,
) -> impl Iterator<Item = Compare<'c>> {
    columns
        .into_iter()
        .zip(params)
        .map(|(column, param)| Compare {
            column: ColumnRef::bare(&column.name),
            param,
        })
}

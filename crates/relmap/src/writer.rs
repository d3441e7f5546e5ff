use crate::relation::{RelationChangeSet, RelationPair};

use relmap_core::{
    schema::Relation,
    stmt::Value,
    Config, Connection, Error, Result,
};
use relmap_sql::{stmt::QueryKey, StatementBuilder, StatementCache};

/// Writes a relation's pending association changes to its join table.
///
/// Inserts are issued one row at a time. Deletes are batched: each statement
/// removes up to `max_keys` pairs with a disjunction of key predicates, and
/// never binds more parameters than the database accepts. The full-size
/// statement is generated once and reused; only a trailing partial chunk
/// needs a statement of its own.
#[derive(Debug)]
pub struct BatchRelationWriter<'a> {
    builder: StatementBuilder<'a>,
    cache: &'a StatementCache,
    max_keys: Option<usize>,
}

impl<'a> BatchRelationWriter<'a> {
    pub fn new(
        builder: StatementBuilder<'a>,
        config: &Config,
        cache: &'a StatementCache,
    ) -> BatchRelationWriter<'a> {
        BatchRelationWriter {
            builder,
            cache,
            max_keys: config.delete_chunk_size(),
        }
    }

    /// Flushes `change_set`: deletes first, then inserts. The change set is
    /// cleared once both succeed. The first failing statement aborts the
    /// flush; statements already executed are not undone.
    pub fn write(
        &self,
        connection: &mut impl Connection,
        change_set: &mut RelationChangeSet,
    ) -> Result<()> {
        if !change_set.is_dirty() {
            return Ok(());
        }

        let relation = self.builder.schema().relation(change_set.relation());

        let removed: Vec<&RelationPair> = change_set.to_remove().collect();
        self.delete_relations(connection, relation, &removed)?;

        let added: Vec<&RelationPair> = change_set.to_add().collect();
        self.insert_relations(connection, relation, &added)?;

        change_set.clear();
        Ok(())
    }

    /// Inserts one join table row per pair.
    pub fn insert_relations(
        &self,
        connection: &mut impl Connection,
        relation: &Relation,
        pairs: &[&RelationPair],
    ) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let key = QueryKey::InsertRelation {
            relation: relation.name.clone(),
        };
        let query = self
            .cache
            .get_or_build(&key, || self.builder.build(&key))?;

        for pair in pairs {
            let params = query.bind(&[pair.left_id().clone(), pair.right_id().clone()])?;
            log::debug!("{} -- {} params", query.sql, params.len());

            connection
                .execute(&query.sql, &params)
                .map_err(|err| err.context(Error::statement_execution("INSERT", &query.table)))?;
        }

        Ok(())
    }

    /// Deletes the join table rows of `pairs`, in chunks of at most
    /// `max_keys` pairs per statement.
    pub fn delete_relations(
        &self,
        connection: &mut impl Connection,
        relation: &Relation,
        pairs: &[&RelationPair],
    ) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let join_table = relation.join_table().ok_or_else(|| {
            Error::query_build(format!(
                "relation `{}` is not mapped to a relation table",
                relation.name
            ))
        })?;
        let pair_width = join_table.left.len() + join_table.right.len();
        let max_pairs = (self.builder.capability().max_params / pair_width).max(1);

        let chunk_size = self
            .max_keys
            .unwrap_or(pairs.len())
            .min(max_pairs)
            .min(pairs.len());

        let full = QueryKey::DeleteRelations {
            relation: relation.name.clone(),
            count: chunk_size,
        };
        let full = self
            .cache
            .get_or_build(&full, || self.builder.build(&full))?;

        for chunk in pairs.chunks(chunk_size) {
            let remainder;
            let query = if chunk.len() == chunk_size {
                &*full
            } else {
                remainder = self.builder.delete_relations(&relation.name, chunk.len())?;
                &remainder
            };

            let args: Vec<Value> = chunk
                .iter()
                .flat_map(|pair| [pair.left_id().clone(), pair.right_id().clone()])
                .collect();
            let params = query.bind(&args)?;

            log::debug!("{} -- {} pair(s)", query.sql, chunk.len());

            connection
                .execute(&query.sql, &params)
                .map_err(|err| err.context(Error::statement_execution("DELETE", &query.table)))?;
        }

        Ok(())
    }
}

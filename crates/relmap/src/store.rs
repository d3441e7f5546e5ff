use crate::{BatchRelationWriter, ReadAheadCache, RelationTracker};

use relmap_core::{
    driver::TransactionManager,
    err,
    schema::{Entity, EntityId},
    stmt::{Value, ValueRecord},
    Config, Connection, Error, Result, Schema,
};
use relmap_sql::{
    stmt::{EntitySelect, JoinNode, Query, QueryKey, Select},
    StatementBuilder, StatementCache,
};

use std::sync::Arc;

/// Runs generated statements against a connection.
///
/// A store is shared by every unit of work of a schema. Statements are
/// generated on first use and cached; the connection, read-ahead cache and
/// relation tracker belong to the caller's unit of work and are passed to
/// each call.
#[derive(Debug)]
pub struct Store<'a> {
    schema: &'a Schema,
    config: &'a Config,
    builder: StatementBuilder<'a>,
    statements: StatementCache,
}

/// Tracks the offset and limit while reading a result.
struct Window {
    offset: u64,
    limit: Option<u64>,
    skipped: u64,
}

impl<'a> Store<'a> {
    pub fn new(schema: &'a Schema, config: &'a Config) -> Store<'a> {
        Store {
            schema,
            config,
            builder: StatementBuilder::new(schema, config),
            statements: StatementCache::new(),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn builder(&self) -> StatementBuilder<'a> {
        self.builder
    }

    pub fn statements(&self) -> &StatementCache {
        &self.statements
    }

    /// Returns the statement for `key`, generating it on first use.
    pub fn statement(&self, key: &QueryKey) -> Result<Arc<Query>> {
        self.statements
            .get_or_build(key, || self.builder.build(key))
    }

    /// Loads one instance by identity together with its eager fields.
    ///
    /// Returns `false` when no row matches. An instance already present in
    /// the read-ahead cache is not selected again.
    pub fn find_by_primary_key(
        &self,
        connection: &mut impl Connection,
        cache: &mut impl ReadAheadCache,
        entity: &str,
        identity: &Value,
    ) -> Result<bool> {
        let entity_id = self.entity(entity)?.id;

        if cache.contains(entity_id, identity) {
            log::trace!("read-ahead hit for {entity} {identity:?}");
            return Ok(true);
        }

        let query = self.statement(&QueryKey::PrimaryKey {
            entity: entity.to_string(),
            eager: true,
        })?;

        let found = self.find(connection, cache, &query, &[identity.clone()])?;
        Ok(!found.is_empty())
    }

    pub fn find_all(
        &self,
        connection: &mut impl Connection,
        cache: &mut impl ReadAheadCache,
        entity: &str,
        distinct: bool,
    ) -> Result<Vec<Value>> {
        let query = self.statement(&QueryKey::FindAll {
            entity: entity.to_string(),
            distinct,
        })?;

        self.find(connection, cache, &query, &[])
    }

    /// Runs a finder such as `findByEmail` with the searched value.
    pub fn find_by_field(
        &self,
        connection: &mut impl Connection,
        cache: &mut impl ReadAheadCache,
        entity: &str,
        finder: &str,
        value: impl Into<Value>,
        distinct: bool,
    ) -> Result<Vec<Value>> {
        let query = self.statement(&QueryKey::FindByField {
            entity: entity.to_string(),
            finder: finder.to_string(),
            distinct,
        })?;

        self.find(connection, cache, &query, &[value.into()])
    }

    /// Loads the identities of the instances related to `identity` through
    /// relation field `field`, and records them in the read-ahead cache.
    pub fn load_relation(
        &self,
        connection: &mut impl Connection,
        cache: &mut impl ReadAheadCache,
        entity: &str,
        field: &str,
        identity: &Value,
    ) -> Result<Vec<Value>> {
        let entity_id = self.entity(entity)?.id;

        let query = self.statement(&QueryKey::Relation {
            entity: entity.to_string(),
            field: field.to_string(),
        })?;

        let related = self.find(connection, cache, &query, &[identity.clone()])?;
        for value in &related {
            cache.add_related(entity_id, identity, field, value.clone());
        }

        Ok(related)
    }

    /// Executes a select and reads its rows.
    ///
    /// Entity selects return identities and hand eager fields and left
    /// joined instances to `cache`. When the select has left joins, rows
    /// repeating the previous identity belong to the same instance. The
    /// offset and limit count instances, not rows, so a joined result is
    /// windowed differently than a row based `OFFSET`/`LIMIT` would. A limit
    /// of 0 returns every instance after the offset.
    pub fn find(
        &self,
        connection: &mut impl Connection,
        cache: &mut impl ReadAheadCache,
        query: &Query,
        args: &[Value],
    ) -> Result<Vec<Value>> {
        if !query.is_select() {
            return Err(Error::query_build(format!(
                "statement on `{}` returns no rows",
                query.table
            )));
        }

        let params = query.bind(args)?;
        let mut window = Window {
            offset: query.offset(args)?,
            limit: query.limit(args)?,
            skipped: 0,
        };

        log::debug!("{} -- {} params", query.sql, params.len());

        let rows = connection
            .query(&query.sql, &params, &query.columns)
            .map_err(|err| err.context(Error::statement_execution("SELECT", &query.table)))?;

        for row in &rows {
            if row.len() != query.columns.len() {
                return Err(err!(
                    "select on `{}` returned {} columns; expected {}",
                    query.table,
                    row.len(),
                    query.columns.len()
                ));
            }
        }

        match &query.select {
            Select::Entity(select) => {
                let results = self.read_entities(cache, select, &rows, &mut window)?;
                cache.add_finder_results(select.entity, &results);
                Ok(results)
            }
            Select::Field { entity, field } => {
                let mapping = &self.schema.entity(*entity).fields[*field].mapping;
                let mut results = vec![];
                for row in &rows {
                    if !window.admit() {
                        continue;
                    }
                    if window.is_full(results.len()) {
                        break;
                    }
                    results.push(mapping.read(row)?);
                }
                Ok(results)
            }
            Select::Function(ty) => {
                let mut results = vec![];
                for row in rows {
                    if !window.admit() {
                        continue;
                    }
                    if window.is_full(results.len()) {
                        break;
                    }
                    let value = row.into_iter().next().unwrap_or_default();
                    results.push(value.coerce(ty)?);
                }
                Ok(results)
            }
            Select::None => Ok(vec![]),
        }
    }

    fn read_entities(
        &self,
        cache: &mut impl ReadAheadCache,
        select: &EntitySelect,
        rows: &[ValueRecord],
        window: &mut Window,
    ) -> Result<Vec<Value>> {
        let entity = self.schema.entity(select.entity);
        let joined = !select.left_joins.is_empty();

        let mut results = vec![];

        // Identity of the instance being read, and whether it is returned
        let mut current: Option<(Value, bool)> = None;

        for row in rows {
            let mut cursor = 0;
            let Some(identity) = read_identity(entity, row, &mut cursor)? else {
                return Err(Error::mapping(format!(
                    "select on `{}` returned a row with a null primary key",
                    entity.table
                )));
            };

            let repeated = joined && matches!(&current, Some((last, _)) if *last == identity);

            if !repeated {
                let keep = window.admit();
                if keep && window.is_full(results.len()) {
                    break;
                }
                if keep {
                    results.push(identity.clone());
                }
                current = Some((identity.clone(), keep));
            }

            if !matches!(current, Some((_, true))) {
                continue;
            }

            let fields = read_fields(entity, &select.eager, row, &mut cursor)?;
            cache.add_preload_data(entity.id, &identity, fields);

            self.read_joins(cache, entity.id, &identity, &select.left_joins, row, &mut cursor)?;
        }

        Ok(results)
    }

    fn read_joins(
        &self,
        cache: &mut impl ReadAheadCache,
        parent: EntityId,
        parent_identity: &Value,
        joins: &[JoinNode],
        row: &[Value],
        cursor: &mut usize,
    ) -> Result<()> {
        for join in joins {
            let related = self.schema.entity(join.entity);
            let start = *cursor;

            match read_identity(related, row, cursor)? {
                Some(identity) => {
                    let fields = read_fields(related, &join.eager, row, cursor)?;
                    cache.add_preload_data(related.id, &identity, fields);
                    cache.add_related(parent, parent_identity, &join.field, identity.clone());

                    self.read_joins(cache, related.id, &identity, &join.left_joins, row, cursor)?;
                }
                None => {
                    // No related row; skip the join's columns
                    *cursor = start + join.width(self.schema);
                }
            }
        }

        Ok(())
    }

    /// Inserts an entity row. `record` holds one value per field, in
    /// declaration order.
    pub fn insert(
        &self,
        connection: &mut impl Connection,
        entity: &str,
        record: &Value,
    ) -> Result<()> {
        let query = self.statement(&QueryKey::InsertEntity {
            entity: entity.to_string(),
        })?;

        self.execute(connection, "INSERT", &query, &[record.clone()])?;
        Ok(())
    }

    /// Deletes an entity row by identity. Returns `false` when no row
    /// matched.
    pub fn delete(
        &self,
        connection: &mut impl Connection,
        entity: &str,
        identity: &Value,
    ) -> Result<bool> {
        let query = self.statement(&QueryKey::DeleteEntity {
            entity: entity.to_string(),
        })?;

        let count = self.execute(connection, "DELETE", &query, &[identity.clone()])?;
        Ok(count > 0)
    }

    /// Writes the pending association changes of every relation in
    /// `tracker`.
    pub fn flush(
        &self,
        connection: &mut impl Connection,
        tracker: &mut RelationTracker<'_>,
    ) -> Result<()> {
        let writer = BatchRelationWriter::new(self.builder, self.config, &self.statements);

        for change_set in tracker.change_sets_mut() {
            writer.write(connection, change_set)?;
        }

        Ok(())
    }

    pub fn create_table(&self, connection: &mut impl Connection, entity: &str) -> Result<()> {
        let query = self.builder.create_table(entity)?;
        self.execute(connection, "CREATE TABLE", &query, &[])?;
        Ok(())
    }

    pub fn create_relation_table(
        &self,
        connection: &mut impl Connection,
        relation: &str,
    ) -> Result<()> {
        let query = self.builder.create_relation_table(relation)?;
        self.execute(connection, "CREATE TABLE", &query, &[])?;
        Ok(())
    }

    /// Creates the indexes of an entity's indexed fields.
    pub fn create_indexes(&self, connection: &mut impl Connection, entity: &str) -> Result<()> {
        for query in self.builder.create_indexes(entity)? {
            self.execute(connection, "CREATE INDEX", &query, &[])?;
        }
        Ok(())
    }

    /// Indexes the key columns of a relation and, where the database can
    /// alter existing tables, adds the foreign key constraints.
    pub fn create_foreign_keys(
        &self,
        connection: &mut impl Connection,
        relation: &str,
    ) -> Result<()> {
        for query in self.builder.foreign_key_indexes(relation)? {
            self.execute(connection, "CREATE INDEX", &query, &[])?;
        }

        let capability = self.builder.capability();
        if !capability.alter_table_constraints {
            log::debug!(
                "{:?} cannot add constraints to existing tables; skipping foreign keys of `{relation}`",
                capability.flavor
            );
            return Ok(());
        }

        for query in self.builder.foreign_key_constraints(relation)? {
            self.execute(connection, "ALTER TABLE", &query, &[])?;
        }
        Ok(())
    }

    /// Drops `table` outside of the caller's transaction.
    ///
    /// The ambient transaction is suspended for the statement and resumed
    /// afterwards. Failures are logged; the return value tells whether the
    /// table was dropped.
    pub fn drop_table<C>(&self, connection: &mut C, table: &str) -> bool
    where
        C: Connection + TransactionManager,
    {
        let transaction = match connection.suspend() {
            Ok(transaction) => transaction,
            Err(err) => {
                log::warn!("could not suspend the transaction to drop table `{table}`: {err}");
                return false;
            }
        };

        let query = self.builder.drop_table(table);
        let dropped = match connection.execute(&query.sql, &[]) {
            Ok(_) => {
                log::debug!("dropped table `{table}`");
                true
            }
            Err(err) => {
                log::warn!("could not drop table `{table}`: {err}");
                false
            }
        };

        if let Some(transaction) = transaction {
            if let Err(err) = connection.resume(transaction) {
                log::warn!("could not resume the transaction after dropping `{table}`: {err}");
            }
        }

        dropped
    }

    fn execute(
        &self,
        connection: &mut impl Connection,
        verb: &'static str,
        query: &Query,
        args: &[Value],
    ) -> Result<u64> {
        let params = query.bind(args)?;
        log::debug!("{} -- {} params", query.sql, params.len());

        connection
            .execute(&query.sql, &params)
            .map_err(|err| err.context(Error::statement_execution(verb, &query.table)))
    }

    fn entity(&self, name: &str) -> Result<&'a Entity> {
        self.schema
            .entity_by_name(name)
            .ok_or_else(|| Error::query_build(format!("unknown entity `{name}`")))
    }
}

impl Window {
    /// Consumes the offset. Returns `true` once the offset is exhausted.
    fn admit(&mut self) -> bool {
        if self.skipped < self.offset {
            self.skipped += 1;
            false
        } else {
            true
        }
    }

    fn is_full(&self, returned: usize) -> bool {
        self.limit.is_some_and(|limit| returned as u64 >= limit)
    }
}

/// Reads the primary key at `cursor`. Returns `None` when every key column
/// is null, as for an unmatched outer join.
fn read_identity(entity: &Entity, row: &[Value], cursor: &mut usize) -> Result<Option<Value>> {
    let width = entity.primary_key_columns();
    let raw = &row[*cursor..*cursor + width];

    if raw.iter().all(Value::is_null) {
        *cursor += width;
        return Ok(None);
    }

    let mut values = Vec::with_capacity(entity.primary_key_width());
    for field in entity.primary_key_fields() {
        let width = field.mapping.width();
        values.push(field.mapping.read(&row[*cursor..*cursor + width])?);
        *cursor += width;
    }

    Ok(Some(entity.identity(values)))
}

fn read_fields(
    entity: &Entity,
    fields: &[usize],
    row: &[Value],
    cursor: &mut usize,
) -> Result<Vec<(usize, Value)>> {
    let mut values = Vec::with_capacity(fields.len());

    for &index in fields {
        let mapping = &entity.fields[index].mapping;
        let width = mapping.width();
        values.push((index, mapping.read(&row[*cursor..*cursor + width])?));
        *cursor += width;
    }

    Ok(values)
}

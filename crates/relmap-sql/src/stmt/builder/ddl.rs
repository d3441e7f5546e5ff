use super::{field_columns, join_table, key_columns, statement, StatementBuilder};
use crate::stmt::Query;

use relmap_core::{
    driver::Flavor,
    mapping::Column,
    schema::{Relation, RelationMapping, Side},
    Result, Schema,
};

impl StatementBuilder<'_> {
    /// `CREATE TABLE` for an entity, with a named primary key constraint.
    pub fn create_table(&self, entity: &str) -> Result<Query> {
        let entity = self.entity(entity)?;

        let columns: Vec<&Column> = entity
            .fields
            .iter()
            .flat_map(|field| field.mapping.columns())
            .collect();
        let key: Vec<&Column> = key_columns(entity).collect();

        Ok(self.create(&entity.table, &columns, &key))
    }

    /// `CREATE TABLE` for a relation table. Every column is part of the
    /// primary key.
    pub fn create_relation_table(&self, relation: &str) -> Result<Query> {
        let relation = self.relation(relation)?;
        let join_table = join_table(relation)?;

        let columns: Vec<&Column> = join_table.left.iter().chain(&join_table.right).collect();

        Ok(self.create(&join_table.table, &columns, &columns))
    }

    /// `CREATE INDEX` for every indexed field of an entity.
    pub fn create_indexes(&self, entity: &str) -> Result<Vec<Query>> {
        let entity = self.entity(entity)?;

        Ok(entity
            .fields
            .iter()
            .filter(|field| field.indexed)
            .map(|field| {
                let columns: Vec<&Column> = field.mapping.columns().iter().collect();
                self.create_index(&entity.table, &field.name, &columns)
            })
            .collect())
    }

    /// `ALTER TABLE .. ADD CONSTRAINT .. FOREIGN KEY` for the key columns of a
    /// relation. A foreign key mapping gets one constraint on the owning
    /// table, a relation table gets one per side.
    pub fn foreign_key_constraints(&self, relation: &str) -> Result<Vec<Query>> {
        let relation = self.relation(relation)?;

        Ok(foreign_keys(self.schema, relation)
            .into_iter()
            .map(|fk| {
                let referenced = self.schema.entity(relation.role(fk.target).entity);
                let name = self.identifier(format!("fk_{}_{}", fk.table, fk.role));

                let sql = format!(
                    "ALTER TABLE {} ADD CONSTRAINT {name} FOREIGN KEY ({}) REFERENCES {} ({})",
                    fk.table,
                    column_list(&fk.columns),
                    referenced.table,
                    column_list(&key_columns(referenced).collect::<Vec<_>>()),
                );
                statement(sql, vec![], fk.table)
            })
            .collect())
    }

    /// `CREATE INDEX` over the foreign key columns of a relation.
    pub fn foreign_key_indexes(&self, relation: &str) -> Result<Vec<Query>> {
        let relation = self.relation(relation)?;

        Ok(foreign_keys(self.schema, relation)
            .into_iter()
            .map(|fk| self.create_index(fk.table, fk.role, &fk.columns))
            .collect())
    }

    pub fn drop_table(&self, table: &str) -> Query {
        statement(format!("DROP TABLE {table}"), vec![], table)
    }

    fn create(&self, table: &str, columns: &[&Column], key: &[&Column]) -> Query {
        let mut defs: Vec<String> = columns
            .iter()
            .map(|column| self.column_def(column))
            .collect();

        let key_names: Vec<&str> = key.iter().map(|column| column.name.as_str()).collect();
        defs.push(format!(
            "CONSTRAINT pk_{table} PRIMARY KEY ({})",
            key_names.join(", ")
        ));

        statement(
            format!("CREATE TABLE {table} ({})", defs.join(", ")),
            vec![],
            table,
        )
    }

    fn create_index(&self, table: &str, name: &str, columns: &[&Column]) -> Query {
        let name = self.identifier(format!("idx_{table}_{name}"));
        statement(
            format!("CREATE INDEX {name} ON {table} ({})", column_list(columns)),
            vec![],
            table,
        )
    }

    /// Cuts a generated constraint or index name to the database limit.
    fn identifier(&self, mut name: String) -> String {
        if let Some((end, _)) = name
            .char_indices()
            .nth(self.capability.max_identifier_length)
        {
            name.truncate(end);
        }
        name
    }

    fn column_def(&self, column: &Column) -> String {
        let mut def = format!("{} ", column.name);

        if column.auto_increment {
            match self.serializer.flavor() {
                // Only `INTEGER` key columns alias the rowid
                Flavor::Sqlite => def.push_str("INTEGER"),
                Flavor::Postgresql => def.push_str("BIGSERIAL"),
                Flavor::Mysql => {
                    def.push_str(&column.sql_type_name());
                    def.push_str(" AUTO_INCREMENT");
                }
            }
        } else {
            def.push_str(&column.sql_type_name());
        }

        if column.not_null {
            def.push_str(" NOT NULL");
        }

        def
    }
}

fn foreign_keys<'r>(schema: &'r Schema, relation: &'r Relation) -> Vec<ForeignKeyColumns<'r>> {
    match &relation.mapping {
        RelationMapping::ForeignKey(fk) => {
            let owner = schema.entity(relation.role(fk.side).entity);
            let target = fk.side.other();

            vec![ForeignKeyColumns {
                table: &owner.table,
                role: &relation.role(target).name,
                target,
                columns: field_columns(owner, &fk.fields).collect(),
            }]
        }
        RelationMapping::Table(join_table) => [Side::Left, Side::Right]
            .into_iter()
            .map(|side| ForeignKeyColumns {
                table: &join_table.table,
                role: &relation.role(side).name,
                target: side,
                columns: join_table.columns(side).iter().collect(),
            })
            .collect(),
    }
}

/// Key columns of one side of a relation, and the role they reference.
struct ForeignKeyColumns<'r> {
    table: &'r str,
    role: &'r str,
    target: Side,
    columns: Vec<&'r Column>,
}

fn column_list(columns: &[&Column]) -> String {
    columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

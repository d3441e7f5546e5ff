use super::{RelationMapping, Schema};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        self.verify_relation_fields_are_unique()?;
        self.verify_column_names_are_unique()?;
        self.verify_join_table_columns_are_unique()?;
        Ok(())
    }

    fn verify_relation_fields_are_unique(&self) -> Result<()> {
        for entity in self.schema.entities() {
            let mut seen = HashSet::new();

            for relation_field in &entity.relations {
                if entity.field_index(&relation_field.name).is_some()
                    || !seen.insert(&relation_field.name)
                {
                    return Err(Error::invalid_schema(format!(
                        "relation field `{}` collides with another field on entity `{}`",
                        relation_field.name, entity.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn verify_column_names_are_unique(&self) -> Result<()> {
        for entity in self.schema.entities() {
            let mut seen = HashSet::new();

            for name in entity.fields.iter().flat_map(|f| f.mapping.column_names()) {
                if !seen.insert(name) {
                    return Err(Error::invalid_schema(format!(
                        "column `{name}` is mapped twice in table `{}`",
                        entity.table
                    )));
                }
            }
        }
        Ok(())
    }

    fn verify_join_table_columns_are_unique(&self) -> Result<()> {
        for relation in self.schema.relations() {
            let RelationMapping::Table(table) = &relation.mapping else {
                continue;
            };

            let mut seen = HashSet::new();
            for column in table.left.iter().chain(&table.right) {
                if !seen.insert(&column.name) {
                    return Err(Error::invalid_schema(format!(
                        "join table `{}` of relation `{}` has duplicate column `{}`; name the key columns explicitly",
                        table.table, relation.name, column.name
                    )));
                }
            }
        }
        Ok(())
    }
}

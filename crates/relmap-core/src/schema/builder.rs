use super::relation::{MappingDef, RoleDef};
use super::{
    Entity, EntityBuilder, EntityId, ForeignKey, JoinTable, Relation, RelationBuilder,
    RelationField, RelationId, RelationMapping, RelationRole, RoleId, Schema, Side,
};
use crate::{mapping::Column, Error, Result};

use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Builder {
    entities: Vec<EntityBuilder>,
    relations: Vec<RelationBuilder>,
}

impl Builder {
    pub fn entity(mut self, entity: EntityBuilder) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn relation(mut self, relation: RelationBuilder) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut entities = vec![];
        let mut entity_lookup = IndexMap::new();

        for (index, builder) in self.entities.into_iter().enumerate() {
            let id = EntityId(index);
            if entity_lookup
                .insert(builder.name().to_string(), id)
                .is_some()
            {
                return Err(Error::invalid_schema(format!(
                    "entity `{}` is declared twice",
                    builder.name()
                )));
            }
            entities.push(builder.build(id)?);
        }

        let mut schema = Schema {
            entities,
            entity_lookup,
            relations: vec![],
        };

        for (index, builder) in self.relations.into_iter().enumerate() {
            let relation = schema.build_relation(RelationId(index), builder)?;

            for role in [&relation.left, &relation.right] {
                if let Some(field) = &role.field {
                    schema.entities[role.entity.0].relations.push(RelationField {
                        name: field.clone(),
                        role: role.id,
                    });
                }
            }

            schema.relations.push(relation);
        }

        schema.verify()?;

        log::debug!(
            "built schema with {} entities and {} relations",
            schema.entities.len(),
            schema.relations.len()
        );

        Ok(schema)
    }
}

impl Schema {
    fn build_relation(&self, id: RelationId, builder: RelationBuilder) -> Result<Relation> {
        let RelationBuilder {
            name,
            left,
            right,
            mapping,
        } = builder;

        if self.relations.iter().any(|relation| relation.name == name) {
            return Err(Error::invalid_schema(format!(
                "relation `{name}` is declared twice"
            )));
        }

        let (Some(left), Some(right)) = (left, right) else {
            return Err(Error::invalid_schema(format!(
                "relation `{name}` must declare both roles"
            )));
        };

        let left_role = self.build_role(id, Side::Left, &left)?;
        let right_role = self.build_role(id, Side::Right, &right)?;

        let mapping = match mapping {
            MappingDef::Unset => {
                return Err(Error::invalid_schema(format!(
                    "relation `{name}` has neither a foreign key nor a join table"
                )))
            }
            MappingDef::ForeignKey { side, fields } => {
                let (owner, target) = match side {
                    Side::Left => (&left_role, &right_role),
                    Side::Right => (&right_role, &left_role),
                };
                let owner = self.entity(owner.entity);
                let target = self.entity(target.entity);

                let fields = fields
                    .iter()
                    .map(|field| {
                        owner.field_index(field).ok_or_else(|| {
                            Error::invalid_schema(format!(
                                "foreign key of relation `{name}` references unknown field `{}.{field}`",
                                owner.name
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                let width: usize = fields
                    .iter()
                    .map(|index| owner.fields[*index].mapping.width())
                    .sum();
                if fields.len() != target.primary_key_width()
                    || width != target.primary_key_columns()
                {
                    return Err(Error::invalid_schema(format!(
                        "foreign key of relation `{name}` does not match the primary key of `{}`",
                        target.name
                    )));
                }

                RelationMapping::ForeignKey(ForeignKey { side, fields })
            }
            MappingDef::Table { table } => RelationMapping::Table(JoinTable {
                left: self.key_columns(&name, &left_role, &left)?,
                right: self.key_columns(&name, &right_role, &right)?,
                table,
            }),
        };

        Ok(Relation {
            id,
            name,
            left: left_role,
            right: right_role,
            mapping,
        })
    }

    fn build_role(&self, relation: RelationId, side: Side, def: &RoleDef) -> Result<RelationRole> {
        let entity = self.entity_by_name(&def.entity).ok_or_else(|| {
            Error::invalid_schema(format!(
                "role `{}` references unknown entity `{}`",
                def.name, def.entity
            ))
        })?;

        Ok(RelationRole {
            id: RoleId { relation, side },
            name: def.name.clone(),
            entity: entity.id,
            field: def.field.clone(),
        })
    }

    /// Join table columns for one side: a copy of every primary key column of
    /// the side's entity.
    fn key_columns(&self, relation: &str, role: &RelationRole, def: &RoleDef) -> Result<Vec<Column>> {
        let entity = self.entity(role.entity);
        let columns: Vec<&Column> = entity
            .primary_key_fields()
            .flat_map(|field| field.mapping.columns())
            .collect();

        if !def.key_columns.is_empty() && def.key_columns.len() != columns.len() {
            return Err(Error::invalid_schema(format!(
                "relation `{relation}` names {} key columns for `{}`, which has {} primary key columns",
                def.key_columns.len(),
                entity.name,
                columns.len()
            )));
        }

        Ok(columns
            .into_iter()
            .enumerate()
            .map(|(index, column)| {
                let name = match def.key_columns.get(index) {
                    Some(name) => name.clone(),
                    None => format!("{}_{}", entity.table, column.name),
                };
                let mut column = column.clone().rename(name).not_null();
                column.auto_increment = false;
                column
            })
            .collect())
    }
}

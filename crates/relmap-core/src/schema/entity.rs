use super::{Field, ReadAhead, RoleId};
use crate::{stmt::Value, Error, Result};

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,

    pub name: String,

    /// Table storing one row per instance
    pub table: String,

    pub fields: Vec<Field>,

    /// Indices into `fields`, in primary key order
    pub primary_key: Vec<usize>,

    /// Named field subsets. `*` holds every non-key field.
    pub load_groups: IndexMap<String, Vec<usize>>,

    pub read_ahead: ReadAhead,

    /// Eager primary key loads use the driver's row locking template
    pub row_locking: bool,

    /// Relation fields, filled in when the schema is built
    pub relations: Vec<RelationField>,
}

/// A navigable relation end on an entity.
#[derive(Debug, Clone)]
pub struct RelationField {
    pub name: String,
    pub role: RoleId,
}

#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    table: Option<String>,
    fields: Vec<Field>,
    primary_key: Vec<String>,
    load_groups: Vec<(String, Vec<String>)>,
    read_ahead: ReadAhead,
    row_locking: bool,
}

impl Entity {
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            name: name.into(),
            table: None,
            fields: vec![],
            primary_key: vec![],
            load_groups: vec![],
            read_ahead: ReadAhead::default(),
            row_locking: false,
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.field_index(name).map(|index| &self.fields[index])
    }

    pub fn primary_key_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.primary_key.iter().map(|index| &self.fields[*index])
    }

    /// Number of fields in the primary key. Identities of entities with more
    /// than one key field are records in key order.
    pub fn primary_key_width(&self) -> usize {
        self.primary_key.len()
    }

    /// Total number of columns backing the primary key.
    pub fn primary_key_columns(&self) -> usize {
        self.primary_key_fields()
            .map(|field| field.mapping.width())
            .sum()
    }

    /// Builds an identity from key field values in key order.
    pub fn identity(&self, mut values: Vec<Value>) -> Value {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Value::record_from_vec(values)
        }
    }

    pub fn load_group(&self, name: &str) -> Result<&[usize]> {
        self.load_groups
            .get(name)
            .map(|fields| &fields[..])
            .ok_or_else(|| {
                Error::query_build(format!(
                    "unknown load group `{name}` on entity `{}`",
                    self.name
                ))
            })
    }

    /// Fields fetched together with the primary key.
    pub fn eager_fields(&self) -> Result<&[usize]> {
        match &self.read_ahead.eager_load_group {
            Some(name) => self.load_group(name),
            None => Ok(&[]),
        }
    }

    pub fn relation_field(&self, name: &str) -> Option<&RelationField> {
        self.relations.iter().find(|field| field.name == name)
    }
}

impl EntityBuilder {
    /// Defaults to the entity name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn load_group<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.load_groups
            .push((name.into(), fields.into_iter().map(Into::into).collect()));
        self
    }

    pub fn read_ahead(mut self, read_ahead: ReadAhead) -> Self {
        self.read_ahead = read_ahead;
        self
    }

    pub fn row_locking(mut self, row_locking: bool) -> Self {
        self.row_locking = row_locking;
        self
    }

    pub(super) fn name(&self) -> &str {
        &self.name
    }

    pub(super) fn build(self, id: EntityId) -> Result<Entity> {
        let EntityBuilder {
            name,
            table,
            mut fields,
            primary_key,
            load_groups,
            read_ahead,
            row_locking,
        } = self;

        let lookup = |fields: &[Field], field: &str| {
            fields.iter().position(|f| f.name == field).ok_or_else(|| {
                Error::invalid_schema(format!("entity `{name}` has no field `{field}`"))
            })
        };

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|other| other.name == field.name) {
                return Err(Error::invalid_schema(format!(
                    "entity `{name}` declares field `{}` twice",
                    field.name
                )));
            }
        }

        if primary_key.is_empty() {
            return Err(Error::invalid_schema(format!(
                "entity `{name}` has no primary key"
            )));
        }

        let primary_key = primary_key
            .iter()
            .map(|field| lookup(&fields, field))
            .collect::<Result<Vec<_>>>()?;

        for index in &primary_key {
            let field = &mut fields[*index];
            if !field.is_searchable() {
                return Err(Error::invalid_schema(format!(
                    "primary key field `{}` of entity `{name}` cannot be used in a predicate",
                    field.name
                )));
            }
            field.primary_key = true;
        }

        let mut groups = IndexMap::new();
        groups.insert(
            "*".to_string(),
            (0..fields.len())
                .filter(|index| !primary_key.contains(index))
                .collect(),
        );

        for (group, members) in load_groups {
            let members = members
                .iter()
                .map(|field| lookup(&fields, field))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .filter(|index| !primary_key.contains(index))
                .collect();
            groups.insert(group, members);
        }

        Ok(Entity {
            id,
            table: table.unwrap_or_else(|| name.clone()),
            name,
            fields,
            primary_key,
            load_groups: groups,
            read_ahead,
            row_locking,
            relations: vec![],
        })
    }
}

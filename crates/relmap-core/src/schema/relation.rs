use super::EntityId;
use crate::mapping::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub usize);

/// One of the two fixed ends of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

/// Identifies a relation end. Association pairs compare roles by this ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId {
    pub relation: RelationId,
    pub side: Side,
}

#[derive(Debug)]
pub struct Relation {
    pub id: RelationId,
    pub name: String,
    pub left: RelationRole,
    pub right: RelationRole,
    pub mapping: RelationMapping,
}

#[derive(Debug)]
pub struct RelationRole {
    pub id: RoleId,

    pub name: String,

    pub entity: EntityId,

    /// Relation field exposing this end on `entity`, if navigable
    pub field: Option<String>,
}

#[derive(Debug)]
pub enum RelationMapping {
    /// Maintained through key columns on one entity's table
    ForeignKey(ForeignKey),

    /// One join table row per associated pair
    Table(JoinTable),
}

#[derive(Debug)]
pub struct ForeignKey {
    /// The side whose table holds the key columns
    pub side: Side,

    /// Fields on that side's entity, matching the other entity's primary key
    /// fields in key order
    pub fields: Vec<usize>,
}

#[derive(Debug)]
pub struct JoinTable {
    pub table: String,

    /// Columns referencing the left entity's primary key
    pub left: Vec<Column>,

    /// Columns referencing the right entity's primary key
    pub right: Vec<Column>,
}

/// Describes a relation before entity names are resolved.
#[derive(Debug, Clone)]
pub struct RelationBuilder {
    pub(super) name: String,
    pub(super) left: Option<RoleDef>,
    pub(super) right: Option<RoleDef>,
    pub(super) mapping: MappingDef,
}

#[derive(Debug, Clone)]
pub(super) struct RoleDef {
    pub(super) name: String,
    pub(super) entity: String,
    pub(super) field: Option<String>,
    pub(super) key_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub(super) enum MappingDef {
    Unset,
    ForeignKey { side: Side, fields: Vec<String> },
    Table { table: String },
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl RoleId {
    pub fn related(self) -> RoleId {
        RoleId {
            relation: self.relation,
            side: self.side.other(),
        }
    }
}

impl Relation {
    pub fn builder(name: impl Into<String>) -> RelationBuilder {
        RelationBuilder {
            name: name.into(),
            left: None,
            right: None,
            mapping: MappingDef::Unset,
        }
    }

    pub fn role(&self, side: Side) -> &RelationRole {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn is_table_mapped(&self) -> bool {
        matches!(self.mapping, RelationMapping::Table(_))
    }

    pub fn join_table(&self) -> Option<&JoinTable> {
        match &self.mapping {
            RelationMapping::Table(table) => Some(table),
            RelationMapping::ForeignKey(_) => None,
        }
    }

    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        match &self.mapping {
            RelationMapping::ForeignKey(fk) => Some(fk),
            RelationMapping::Table(_) => None,
        }
    }
}

impl JoinTable {
    pub fn columns(&self, side: Side) -> &[Column] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl RelationBuilder {
    pub fn left(self, role: &str, entity: &str, field: Option<&str>) -> Self {
        self.role(Side::Left, role, entity, field)
    }

    pub fn right(self, role: &str, entity: &str, field: Option<&str>) -> Self {
        self.role(Side::Right, role, entity, field)
    }

    fn role(mut self, side: Side, role: &str, entity: &str, field: Option<&str>) -> Self {
        let def = Some(RoleDef {
            name: role.to_string(),
            entity: entity.to_string(),
            field: field.map(str::to_string),
            key_columns: vec![],
        });
        match side {
            Side::Left => self.left = def,
            Side::Right => self.right = def,
        }
        self
    }

    /// Key columns of `side` live in that side's table, as the listed fields.
    pub fn foreign_key<I, S>(mut self, side: Side, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapping = MappingDef::ForeignKey {
            side,
            fields: fields.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.mapping = MappingDef::Table {
            table: table.into(),
        };
        self
    }

    /// Names the join table columns referencing `side`'s entity. Defaults to
    /// `<entity table>_<key column>`.
    pub fn key_columns<I, S>(mut self, side: Side, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let role = match side {
            Side::Left => self.left.as_mut(),
            Side::Right => self.right.as_mut(),
        };
        if let Some(role) = role {
            role.key_columns = columns.into_iter().map(Into::into).collect();
        }
        self
    }
}

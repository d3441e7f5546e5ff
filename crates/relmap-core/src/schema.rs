mod builder;
pub use builder::Builder;

pub mod db;

mod entity;
pub use entity::{Entity, EntityBuilder, EntityId, RelationField};

mod field;
pub use field::Field;

mod read_ahead;
pub use read_ahead::{LeftJoin, ReadAhead, Strategy};

mod relation;
pub use relation::{
    ForeignKey, JoinTable, Relation, RelationBuilder, RelationId, RelationMapping, RelationRole,
    RoleId, Side,
};

mod verify;

use indexmap::IndexMap;

/// Entity and relation metadata. Read-only once built.
#[derive(Debug)]
pub struct Schema {
    entities: Vec<Entity>,
    entity_lookup: IndexMap<String, EntityId>,
    relations: Vec<Relation>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        self.entities.get(id.0).expect("invalid entity ID")
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entity_lookup.get(name).map(|id| self.entity(*id))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        self.relations.get(id.0).expect("invalid relation ID")
    }

    pub fn relation_by_name(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn role(&self, id: RoleId) -> &RelationRole {
        self.relation(id.relation).role(id.side)
    }

    /// The role on the other end of the relation.
    pub fn related_role(&self, id: RoleId) -> &RelationRole {
        self.relation(id.relation).role(id.side.other())
    }
}

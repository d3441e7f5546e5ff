use super::RelationChangeSet;

use indexmap::IndexMap;
use relmap_core::{
    schema::{RelationId, RoleId},
    stmt::Value,
    Result, Schema,
};

/// The association changes of one unit of work, one change set per relation.
#[derive(Debug)]
pub struct RelationTracker<'a> {
    schema: &'a Schema,
    change_sets: IndexMap<RelationId, RelationChangeSet>,
}

impl<'a> RelationTracker<'a> {
    pub fn new(schema: &'a Schema) -> RelationTracker<'a> {
        RelationTracker {
            schema,
            change_sets: IndexMap::new(),
        }
    }

    pub fn add_relation(
        &mut self,
        role: RoleId,
        id: impl Into<Value>,
        related_role: RoleId,
        related_id: impl Into<Value>,
    ) -> Result<()> {
        self.change_set_mut(role.relation)
            .add_relation(role, id, related_role, related_id)
    }

    pub fn remove_relation(
        &mut self,
        role: RoleId,
        id: impl Into<Value>,
        related_role: RoleId,
        related_id: impl Into<Value>,
    ) -> Result<()> {
        self.change_set_mut(role.relation)
            .remove_relation(role, id, related_role, related_id)
    }

    pub fn change_set(&self, relation: RelationId) -> Option<&RelationChangeSet> {
        self.change_sets.get(&relation)
    }

    pub fn change_set_mut(&mut self, relation: RelationId) -> &mut RelationChangeSet {
        let schema = self.schema;
        self.change_sets
            .entry(relation)
            .or_insert_with(|| RelationChangeSet::new(schema.relation(relation)))
    }

    pub fn change_sets_mut(&mut self) -> impl Iterator<Item = &mut RelationChangeSet> {
        self.change_sets.values_mut()
    }

    pub fn is_dirty(&self) -> bool {
        self.change_sets.values().any(RelationChangeSet::is_dirty)
    }
}

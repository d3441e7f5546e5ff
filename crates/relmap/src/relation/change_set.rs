use super::RelationPair;

use indexmap::IndexSet;
use relmap_core::{
    schema::{Relation, RelationId, RoleId},
    stmt::Value,
    Error, Result,
};

/// Pending association changes for one relation within a unit of work.
///
/// Every pair is in at most one of three states: pending insertion
/// (`to_add`), pending deletion (`to_remove`), or suppressed. A pair is
/// suppressed when it was added and then removed again before flushing, so
/// a later removal does not schedule a delete for a row that never existed.
///
/// | state     | add         | remove                   |
/// |-----------|-------------|--------------------------|
/// | untracked | `to_add`    | `to_remove` (unless suppressed) |
/// | to_add    | unchanged   | untracked, suppressed    |
/// | to_remove | untracked   | unchanged                |
///
/// Relations maintained through a foreign key never enter a change set; the
/// key is written with the owning entity's row.
#[derive(Debug)]
pub struct RelationChangeSet {
    relation: RelationId,
    left: RoleId,
    right: RoleId,
    table_mapped: bool,
    to_add: IndexSet<RelationPair>,
    to_remove: IndexSet<RelationPair>,
    suppressed: IndexSet<RelationPair>,
}

impl RelationChangeSet {
    pub fn new(relation: &Relation) -> RelationChangeSet {
        RelationChangeSet {
            relation: relation.id,
            left: relation.left.id,
            right: relation.right.id,
            table_mapped: relation.is_table_mapped(),
            to_add: IndexSet::new(),
            to_remove: IndexSet::new(),
            suppressed: IndexSet::new(),
        }
    }

    pub fn relation(&self) -> RelationId {
        self.relation
    }

    /// Records that the instance `id` playing `role` is now associated with
    /// `related_id` playing `related_role`.
    pub fn add_relation(
        &mut self,
        role: RoleId,
        id: impl Into<Value>,
        related_role: RoleId,
        related_id: impl Into<Value>,
    ) -> Result<()> {
        let Some(pair) = self.pair(role, id, related_role, related_id)? else {
            return Ok(());
        };

        if self.to_remove.shift_remove(&pair) {
            log::trace!("add cancels pending removal: {pair:?}");
            return Ok(());
        }

        self.suppressed.shift_remove(&pair);
        if self.to_add.insert(pair) {
            log::trace!("relation {:?}: {} pair(s) to add", self.relation, self.to_add.len());
        }

        Ok(())
    }

    /// Records that the association between the two instances was removed.
    pub fn remove_relation(
        &mut self,
        role: RoleId,
        id: impl Into<Value>,
        related_role: RoleId,
        related_id: impl Into<Value>,
    ) -> Result<()> {
        let Some(pair) = self.pair(role, id, related_role, related_id)? else {
            return Ok(());
        };

        if self.to_add.shift_remove(&pair) {
            log::trace!("remove cancels pending add: {pair:?}");
            self.suppressed.insert(pair);
            return Ok(());
        }

        if self.suppressed.contains(&pair) {
            return Ok(());
        }

        if self.to_remove.insert(pair) {
            log::trace!(
                "relation {:?}: {} pair(s) to remove",
                self.relation,
                self.to_remove.len()
            );
        }

        Ok(())
    }

    /// `true` when there are inserts or deletes to flush.
    pub fn is_dirty(&self) -> bool {
        !self.to_add.is_empty() || !self.to_remove.is_empty()
    }

    pub fn to_add(&self) -> impl ExactSizeIterator<Item = &RelationPair> {
        self.to_add.iter()
    }

    pub fn to_remove(&self) -> impl ExactSizeIterator<Item = &RelationPair> {
        self.to_remove.iter()
    }

    pub fn is_suppressed(&self, pair: &RelationPair) -> bool {
        self.suppressed.contains(pair)
    }

    /// Forgets every tracked pair, including suppressed ones.
    pub fn clear(&mut self) {
        self.to_add.clear();
        self.to_remove.clear();
        self.suppressed.clear();
    }

    /// Validates the roles and orients the pair to the relation's fixed
    /// left and right ends. Returns `None` for foreign key relations.
    fn pair(
        &self,
        role: RoleId,
        id: impl Into<Value>,
        related_role: RoleId,
        related_id: impl Into<Value>,
    ) -> Result<Option<RelationPair>> {
        let pair = if role == self.left && related_role == self.right {
            RelationPair::new(role, id, related_role, related_id)
        } else if role == self.right && related_role == self.left {
            RelationPair::new(role, id, related_role, related_id).swap()
        } else {
            return Err(Error::relationship_state(format!(
                "roles {role:?} and {related_role:?} are not the two ends of relation {:?}",
                self.relation
            )));
        };

        if !self.table_mapped {
            return Ok(None);
        }

        Ok(Some(pair))
    }
}

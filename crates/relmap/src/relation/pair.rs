use relmap_core::{schema::RoleId, stmt::Value};

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

/// One association between two entity instances, as a join table row.
///
/// The pair is unordered: `(a, x) <-> (b, y)` and `(b, y) <-> (a, x)` are
/// equal and hash identically.
#[derive(Debug, Clone)]
pub struct RelationPair {
    left: (RoleId, Value),
    right: (RoleId, Value),
}

impl RelationPair {
    pub fn new(
        role: RoleId,
        id: impl Into<Value>,
        related_role: RoleId,
        related_id: impl Into<Value>,
    ) -> RelationPair {
        RelationPair {
            left: (role, id.into()),
            right: (related_role, related_id.into()),
        }
    }

    pub fn left_role(&self) -> RoleId {
        self.left.0
    }

    pub fn left_id(&self) -> &Value {
        &self.left.1
    }

    pub fn right_role(&self) -> RoleId {
        self.right.0
    }

    pub fn right_id(&self) -> &Value {
        &self.right.1
    }

    /// The identity held by `role`, if it is one of the pair's roles.
    pub fn id_for(&self, role: RoleId) -> Option<&Value> {
        if self.left.0 == role {
            Some(&self.left.1)
        } else if self.right.0 == role {
            Some(&self.right.1)
        } else {
            None
        }
    }

    /// Returns the pair with its halves swapped.
    pub fn swap(self) -> RelationPair {
        RelationPair {
            left: self.right,
            right: self.left,
        }
    }
}

impl PartialEq for RelationPair {
    fn eq(&self, other: &Self) -> bool {
        (self.left == other.left && self.right == other.right)
            || (self.left == other.right && self.right == other.left)
    }
}

impl Eq for RelationPair {}

impl Hash for RelationPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let a = hash_half(&self.left);
        let b = hash_half(&self.right);

        // Order-independent
        state.write_u64(a.min(b));
        state.write_u64(a.max(b));
    }
}

fn hash_half(half: &(RoleId, Value)) -> u64 {
    let mut hasher = DefaultHasher::new();
    half.hash(&mut hasher);
    hasher.finish()
}

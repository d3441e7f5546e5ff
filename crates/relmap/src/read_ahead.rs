use indexmap::IndexMap;
use relmap_core::{schema::EntityId, stmt::Value};

use std::collections::HashMap;

/// Receives the data a select reads beyond the entity keys.
///
/// Finders hand every row's eager field values and left-joined relations to
/// the cache, so later field loads and primary key lookups within the same
/// unit of work need no further round trip.
pub trait ReadAheadCache {
    /// `true` when the instance has been loaded by an earlier select.
    fn contains(&self, entity: EntityId, identity: &Value) -> bool;

    /// The preloaded value of `field`, if it was read.
    fn preloaded(&self, entity: EntityId, identity: &Value, field: usize) -> Option<&Value>;

    /// Stores the field values read with one instance. An empty `fields`
    /// still marks the instance as loaded.
    fn add_preload_data(&mut self, entity: EntityId, identity: &Value, fields: Vec<(usize, Value)>);

    /// Records an instance related to `identity` through relation field
    /// `field`.
    fn add_related(&mut self, entity: EntityId, identity: &Value, field: &str, related: Value);

    /// Records the identities returned by a finder, in result order.
    fn add_finder_results(&mut self, entity: EntityId, results: &[Value]);
}

/// A [`ReadAheadCache`] held in memory for the length of a unit of work.
#[derive(Debug, Default)]
pub struct ReadAheadMap {
    loaded: HashMap<(EntityId, Value), IndexMap<usize, Value>>,
    related: HashMap<(EntityId, Value, String), Vec<Value>>,
    finder_results: Vec<(EntityId, Vec<Value>)>,

    /// Finder result lists kept before the oldest are evicted
    max_finder_results: Option<usize>,
}

impl ReadAheadMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache keeping at most `max` finder result lists.
    pub fn with_finder_result_limit(max: usize) -> Self {
        Self {
            max_finder_results: Some(max),
            ..Self::default()
        }
    }

    /// Related instances recorded for `field`, in the order they were read.
    pub fn related(&self, entity: EntityId, identity: &Value, field: &str) -> &[Value] {
        self.related
            .get(&(entity, identity.clone(), field.to_string()))
            .map(|related| &related[..])
            .unwrap_or(&[])
    }

    pub fn finder_results(&self) -> &[(EntityId, Vec<Value>)] {
        &self.finder_results
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.related.clear();
        self.finder_results.clear();
    }
}

impl ReadAheadCache for ReadAheadMap {
    fn contains(&self, entity: EntityId, identity: &Value) -> bool {
        self.loaded.contains_key(&(entity, identity.clone()))
    }

    fn preloaded(&self, entity: EntityId, identity: &Value, field: usize) -> Option<&Value> {
        self.loaded
            .get(&(entity, identity.clone()))
            .and_then(|fields| fields.get(&field))
    }

    fn add_preload_data(&mut self, entity: EntityId, identity: &Value, fields: Vec<(usize, Value)>) {
        self.loaded
            .entry((entity, identity.clone()))
            .or_default()
            .extend(fields);
    }

    fn add_related(&mut self, entity: EntityId, identity: &Value, field: &str, related: Value) {
        let entry = self
            .related
            .entry((entity, identity.clone(), field.to_string()))
            .or_default();

        if !entry.contains(&related) {
            entry.push(related);
        }
    }

    fn add_finder_results(&mut self, entity: EntityId, results: &[Value]) {
        self.finder_results.push((entity, results.to_vec()));

        if let Some(max) = self.max_finder_results {
            let excess = self.finder_results.len().saturating_sub(max);
            self.finder_results.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preload_marks_loaded() {
        let mut cache = ReadAheadMap::new();
        let id = Value::from(1_i64);

        assert!(!cache.contains(EntityId(0), &id));
        cache.add_preload_data(EntityId(0), &id, vec![]);
        assert!(cache.contains(EntityId(0), &id));
        assert!(!cache.contains(EntityId(1), &id));
        assert_eq!(cache.preloaded(EntityId(0), &id, 1), None);

        cache.add_preload_data(EntityId(0), &id, vec![(1, Value::from("Ada"))]);
        assert_eq!(cache.preloaded(EntityId(0), &id, 1), Some(&Value::from("Ada")));
    }

    #[test]
    fn related_are_deduplicated() {
        let mut cache = ReadAheadMap::new();
        let id = Value::from(1_i64);

        cache.add_related(EntityId(0), &id, "orders", Value::from(10_i64));
        cache.add_related(EntityId(0), &id, "orders", Value::from(10_i64));
        cache.add_related(EntityId(0), &id, "orders", Value::from(11_i64));

        assert_eq!(
            cache.related(EntityId(0), &id, "orders"),
            [Value::from(10_i64), Value::from(11_i64)]
        );
        assert!(cache.related(EntityId(0), &id, "products").is_empty());
    }

    #[test]
    fn finder_results_evict_oldest() {
        let mut cache = ReadAheadMap::with_finder_result_limit(2);

        for id in 1..=3_i64 {
            cache.add_finder_results(EntityId(0), &[Value::from(id)]);
        }

        assert_eq!(
            cache.finder_results(),
            [
                (EntityId(0), vec![Value::from(2_i64)]),
                (EntityId(0), vec![Value::from(3_i64)]),
            ]
        );

        let mut unbounded = ReadAheadMap::new();
        for id in 1..=3_i64 {
            unbounded.add_finder_results(EntityId(0), &[Value::from(id)]);
        }
        assert_eq!(unbounded.finder_results().len(), 3);
    }
}

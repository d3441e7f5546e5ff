use crate::stmt::{Query, QueryKey};

use relmap_core::Result;

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Generated statements, keyed by what they do.
///
/// Statements depend only on metadata and configuration, so one cache can
/// serve every connection of a schema.
#[derive(Debug, Default)]
pub struct StatementCache {
    queries: RwLock<HashMap<QueryKey, Arc<Query>>>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<Arc<Query>> {
        let queries = self.queries.read().unwrap_or_else(|err| err.into_inner());
        queries.get(key).cloned()
    }

    /// Stores `query` under `key`, replacing any previous entry.
    pub fn insert(&self, key: QueryKey, query: Query) -> Arc<Query> {
        let query = Arc::new(query);
        let mut queries = self.queries.write().unwrap_or_else(|err| err.into_inner());
        queries.insert(key, query.clone());
        query
    }

    /// Returns the cached statement, building and storing it on a miss.
    pub fn get_or_build(
        &self,
        key: &QueryKey,
        build: impl FnOnce() -> Result<Query>,
    ) -> Result<Arc<Query>> {
        if let Some(query) = self.get(key) {
            return Ok(query);
        }

        log::debug!("statement cache miss for {key:?}");
        let query = build()?;
        Ok(self.insert(key.clone(), query))
    }

    pub fn len(&self) -> usize {
        self.queries
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Select;

    fn query(sql: &str) -> Query {
        Query {
            sql: sql.to_string(),
            params: vec![],
            columns: vec![],
            select: Select::None,
            offset: None,
            limit: None,
            table: "t".to_string(),
        }
    }

    #[test]
    fn builds_once() {
        let cache = StatementCache::new();
        let key = QueryKey::DeleteEntity {
            entity: "Order".to_string(),
        };

        let mut builds = 0;
        for _ in 0..3 {
            let q = cache
                .get_or_build(&key, || {
                    builds += 1;
                    Ok(query("DELETE FROM orders WHERE id = ?"))
                })
                .unwrap();
            assert_eq!(q.sql, "DELETE FROM orders WHERE id = ?");
        }

        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let cache = StatementCache::new();
        let key = QueryKey::FindAll {
            entity: "Missing".to_string(),
            distinct: false,
        };

        let err = cache
            .get_or_build(&key, || Err(relmap_core::Error::query_build("unknown entity")))
            .unwrap_err();
        assert!(err.is_query_build());
        assert!(cache.is_empty());
    }
}

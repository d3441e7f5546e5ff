/// How an entity's data is prefetched when it is found or loaded.
#[derive(Debug, Clone)]
pub struct ReadAhead {
    pub strategy: Strategy,

    /// Load group fetched with the primary key. `None` fetches no extra
    /// fields.
    pub eager_load_group: Option<String>,

    /// Related entities fetched in the same statement
    pub left_joins: Vec<LeftJoin>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Only primary keys are selected by finders
    None,

    /// Eager fields are loaded on first access
    #[default]
    OnLoad,

    /// Finders select eager fields and joined relations up front
    OnFind,
}

/// A relation followed with `LEFT OUTER JOIN` when eager loading.
#[derive(Debug, Clone)]
pub struct LeftJoin {
    /// Relation field on the parent entity
    pub field: String,

    /// Load group of the related entity to select
    pub eager_load_group: Option<String>,

    pub left_joins: Vec<LeftJoin>,
}

impl ReadAhead {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn eager_load_group(mut self, group: Option<&str>) -> Self {
        self.eager_load_group = group.map(str::to_string);
        self
    }

    pub fn left_join(mut self, join: LeftJoin) -> Self {
        self.left_joins.push(join);
        self
    }
}

impl Default for ReadAhead {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            eager_load_group: Some("*".to_string()),
            left_joins: vec![],
        }
    }
}

impl LeftJoin {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            eager_load_group: None,
            left_joins: vec![],
        }
    }

    pub fn eager_load_group(mut self, group: &str) -> Self {
        self.eager_load_group = Some(group.to_string());
        self
    }

    pub fn left_join(mut self, join: LeftJoin) -> Self {
        self.left_joins.push(join);
        self
    }
}

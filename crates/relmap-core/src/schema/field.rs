use crate::mapping::{Column, ColumnMapping};

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,

    /// Shared with prepared statements that bind or read this field
    pub mapping: Arc<ColumnMapping>,

    /// Set when the field is part of the entity's primary key
    pub primary_key: bool,

    /// Set when table creation should also index the field's columns
    pub indexed: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, mapping: ColumnMapping) -> Self {
        Self {
            name: name.into(),
            mapping: Arc::new(mapping),
            primary_key: false,
            indexed: false,
        }
    }

    /// A field stored in a single column without a transformer.
    pub fn simple(name: impl Into<String>, column: Column) -> Self {
        Self::new(name, ColumnMapping::simple(column))
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn is_searchable(&self) -> bool {
        self.mapping.is_searchable()
    }
}

use super::Accessor;
use crate::{
    schema::db,
    stmt::{self, Value, ValueRecord},
    Error, Result,
};

use indexmap::IndexMap;
use std::sync::Arc;

/// A value object type whose properties are flattened across columns by a
/// decomposed mapping.
#[derive(Debug, Clone)]
pub struct ValueClass {
    pub name: String,
    pub properties: Vec<Property>,
    constructor: Constructor,
}

#[derive(Clone)]
enum Constructor {
    None,
    /// A record with one null field per property
    Record,
    Custom(Arc<dyn Fn() -> Value + Send + Sync>),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,

    /// Column name segment for this property
    pub column: String,

    pub kind: PropertyKind,

    pub not_null: bool,

    /// Defaults to record field access by declaration position
    pub accessor: Option<Accessor>,
}

#[derive(Debug, Clone)]
pub enum PropertyKind {
    /// Stored in one column
    Column {
        ty: stmt::Type,
        storage_ty: Option<db::Type>,
    },

    /// Another value class, flattened in place
    Class(String),
}

/// Registry of value classes, looked up by name when building decomposed
/// mappings.
#[derive(Debug, Clone, Default)]
pub struct ValueClasses {
    classes: IndexMap<String, ValueClass>,
}

impl ValueClass {
    /// A class without a default constructor. A null instance cannot be
    /// populated from columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: vec![],
            constructor: Constructor::None,
        }
    }

    /// A record-backed class that can be default-constructed.
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            constructor: Constructor::Record,
            ..Self::new(name)
        }
    }

    pub fn constructor(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.constructor = Constructor::Custom(Arc::new(f));
        self
    }

    pub fn property(mut self, mut property: Property) -> Self {
        if property.accessor.is_none() {
            property.accessor = Some(Accessor::field(self.properties.len()));
        }
        self.properties.push(property);
        self
    }

    pub fn has_default_constructor(&self) -> bool {
        !matches!(self.constructor, Constructor::None)
    }

    /// Creates a default instance.
    pub fn instantiate(&self) -> Result<Value> {
        match &self.constructor {
            Constructor::None => Err(Error::mapping(format!(
                "value class `{}` has no default constructor",
                self.name
            ))),
            Constructor::Record => Ok(ValueRecord::nulls(self.properties.len()).into()),
            Constructor::Custom(f) => Ok(f()),
        }
    }
}

impl Property {
    pub fn column(name: impl Into<String>, column: impl Into<String>, ty: stmt::Type) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            kind: PropertyKind::Column {
                ty,
                storage_ty: None,
            },
            not_null: false,
            accessor: None,
        }
    }

    pub fn class(
        name: impl Into<String>,
        column: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            kind: PropertyKind::Class(class.into()),
            not_null: false,
            accessor: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn storage_ty(mut self, storage: db::Type) -> Self {
        if let PropertyKind::Column { storage_ty, .. } = &mut self.kind {
            *storage_ty = Some(storage);
        }
        self
    }

    pub fn accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }
}

impl ValueClasses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ValueClass) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    pub fn get(&self, name: &str) -> Result<&ValueClass> {
        self.classes
            .get(name)
            .ok_or_else(|| Error::mapping(format!("unknown value class `{name}`")))
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constructor::None => f.write_str("None"),
            Constructor::Record => f.write_str("Record"),
            Constructor::Custom(_) => f.write_str("Custom"),
        }
    }
}

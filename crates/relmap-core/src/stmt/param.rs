use super::Value;
use crate::schema::db;

/// A value bound to a statement placeholder, together with the storage type
/// of the column it is compared with or written to. Null values keep the
/// declared type so drivers can bind a typed NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub value: Value,
    pub ty: db::Type,
}

impl Param {
    pub fn new(value: impl Into<Value>, ty: db::Type) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }

    pub fn null(ty: db::Type) -> Self {
        Self {
            value: Value::Null,
            ty,
        }
    }
}

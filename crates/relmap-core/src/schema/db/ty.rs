use crate::{stmt, Error, Result};

/// Database-level storage types representing how values are stored in the
/// target database.
///
/// `db::Type` is what appears in `CREATE TABLE` and what drivers use to bind
/// parameters and decode result columns. The logical type of a value, as the
/// mapping layer sees it, is [`stmt::Type`].
///
/// ```text
/// stmt::Type::I64      →  db::Type::Integer(8)
/// stmt::Type::Decimal  →  db::Type::Numeric(None)
/// stmt::Type::Bytes    →  db::Type::Blob
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A boolean value
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// Double precision floating point
    Real,

    /// Decimal number with optional precision and scale.
    Numeric(Option<(u32, u32)>),

    /// Unconstrained text type
    Text,

    /// Text type with an explicit maximum length
    VarChar(u64),

    /// 128-bit universally unique identifier
    Uuid,

    /// Binary large object
    Blob,

    /// Character large object
    Clob,

    /// User-specified type, passed through to DDL as written
    Custom(String),
}

impl Type {
    /// Maps a logical type to its default storage type.
    pub fn from_app(ty: &stmt::Type) -> Result<Type> {
        match ty {
            stmt::Type::Bool => Ok(Type::Boolean),
            stmt::Type::I32 => Ok(Type::Integer(4)),
            stmt::Type::I64 => Ok(Type::Integer(8)),
            stmt::Type::F64 => Ok(Type::Real),
            stmt::Type::Decimal => Ok(Type::Numeric(None)),
            stmt::Type::String => Ok(Type::Text),
            stmt::Type::Bytes => Ok(Type::Blob),
            stmt::Type::Uuid => Ok(Type::Uuid),
            stmt::Type::Record(_) => Err(Error::invalid_schema(
                "record values are stored through a decomposed mapping, not a single column",
            )),
        }
    }

    /// Binary and character large objects. Columns of these types cannot be
    /// compared in predicates.
    pub fn is_large_object(&self) -> bool {
        matches!(self, Type::Blob | Type::Clob)
    }

    /// The type name used in DDL.
    pub fn sql_name(&self) -> String {
        match self {
            Type::Boolean => "BOOLEAN".to_string(),
            Type::Integer(1 | 2) => "SMALLINT".to_string(),
            Type::Integer(8) => "BIGINT".to_string(),
            Type::Integer(_) => "INTEGER".to_string(),
            Type::Real => "DOUBLE PRECISION".to_string(),
            Type::Numeric(None) => "NUMERIC".to_string(),
            Type::Numeric(Some((precision, scale))) => format!("NUMERIC({precision}, {scale})"),
            Type::Text => "TEXT".to_string(),
            Type::VarChar(size) => format!("VARCHAR({size})"),
            Type::Uuid => "UUID".to_string(),
            Type::Blob => "BLOB".to_string(),
            Type::Clob => "CLOB".to_string(),
            Type::Custom(name) => name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_objects() {
        assert!(Type::Blob.is_large_object());
        assert!(Type::Clob.is_large_object());
        assert!(!Type::Text.is_large_object());
        assert!(!Type::VarChar(255).is_large_object());
    }

    #[test]
    fn record_has_no_storage_type() {
        let err = Type::from_app(&stmt::Type::Record(vec![stmt::Type::String])).unwrap_err();
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn sql_names() {
        assert_eq!(Type::Integer(8).sql_name(), "BIGINT");
        assert_eq!(Type::Numeric(Some((10, 2))).sql_name(), "NUMERIC(10, 2)");
        assert_eq!(Type::VarChar(64).sql_name(), "VARCHAR(64)");
    }
}

/// The logical type of a field or column value, as seen by the mapping layer.
///
/// This is distinct from [`db::Type`](crate::schema::db::Type), which is how
/// the database stores the column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point number
    F64,

    /// Exact decimal number
    Decimal,

    /// String type
    String,

    /// Byte array
    Bytes,

    /// Universally unique identifier
    Uuid,

    /// A value object made of the listed property types. Used by decomposed
    /// field mappings.
    Record(Vec<Type>),
}

impl Type {
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64 | Self::Decimal)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::F64 => "F64",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Bytes => "Bytes",
            Self::Uuid => "Uuid",
            Self::Record(_) => "Record",
        }
    }
}

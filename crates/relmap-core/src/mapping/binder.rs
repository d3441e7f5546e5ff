use crate::{
    schema::db,
    stmt::{Type, Value},
    Result,
};

/// Prepares a non-null column value for the driver. Selected once per column
/// from its storage type and logical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamBinder {
    Boolean,
    Integer,
    Real,
    /// Binds exact decimals as decimals; other numbers pass through.
    Numeric,
    Text,
    Uuid,
    /// Text stored in a `Uuid` column as its canonical string form
    UuidText,
    /// Binary large objects are bound as a complete byte buffer.
    LargeBinary,
    /// Character large objects are bound as a complete string.
    LargeText,
}

impl ParamBinder {
    pub fn for_types(storage_ty: &db::Type, ty: &Type) -> ParamBinder {
        match storage_ty {
            db::Type::Blob => ParamBinder::LargeBinary,
            db::Type::Clob => ParamBinder::LargeText,
            db::Type::Boolean => ParamBinder::Boolean,
            db::Type::Integer(_) => ParamBinder::Integer,
            db::Type::Real => ParamBinder::Real,
            db::Type::Numeric(_) => ParamBinder::Numeric,
            db::Type::Uuid => ParamBinder::Uuid,
            db::Type::Text | db::Type::VarChar(_) | db::Type::Custom(_) => match ty {
                Type::Uuid => ParamBinder::UuidText,
                _ => ParamBinder::Text,
            },
        }
    }

    pub fn bind(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (ParamBinder::Boolean, value) => value.coerce(&Type::Bool),
            (ParamBinder::Integer, value @ (Value::I32(_) | Value::I64(_))) => Ok(value),
            (ParamBinder::Integer, value) => value.coerce(&Type::I64),
            (ParamBinder::Real, value) => value.coerce(&Type::F64),
            (
                ParamBinder::Numeric,
                value @ (Value::Decimal(_) | Value::I32(_) | Value::I64(_) | Value::F64(_)),
            ) => Ok(value),
            (ParamBinder::Numeric, value) => value.coerce(&Type::Decimal),
            (ParamBinder::Text | ParamBinder::UuidText, value) => value.coerce(&Type::String),
            (ParamBinder::Uuid, value) => value.coerce(&Type::Uuid),
            (ParamBinder::LargeBinary, value) => value.coerce(&Type::Bytes),
            (ParamBinder::LargeText, value) => value.coerce(&Type::String),
        }
    }
}

/// Converts a raw driver value back to the column's logical type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultReader {
    Value(Type),
    /// Numeric columns may come back as floating point from drivers without
    /// a decimal type; they are re-parsed from their shortest text form.
    Numeric(Type),
}

impl ResultReader {
    pub fn for_types(storage_ty: &db::Type, ty: &Type) -> ResultReader {
        match storage_ty {
            db::Type::Numeric(_) => ResultReader::Numeric(ty.clone()),
            _ => ResultReader::Value(ty.clone()),
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            ResultReader::Value(ty) | ResultReader::Numeric(ty) => ty,
        }
    }

    pub fn read(&self, raw: Value) -> Result<Value> {
        match (self, raw) {
            (ResultReader::Numeric(ty @ Type::Decimal), Value::F64(v)) => {
                Value::String(v.to_string()).coerce(ty)
            }
            (ResultReader::Numeric(ty), raw) | (ResultReader::Value(ty), raw) => raw.coerce(ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection() {
        assert_eq!(
            ParamBinder::for_types(&db::Type::Blob, &Type::Bytes),
            ParamBinder::LargeBinary
        );
        assert_eq!(
            ParamBinder::for_types(&db::Type::Text, &Type::Uuid),
            ParamBinder::UuidText
        );
        assert_eq!(
            ParamBinder::for_types(&db::Type::Numeric(None), &Type::Decimal),
            ParamBinder::Numeric
        );
    }

    #[test]
    fn uuid_in_text_column() {
        let id = uuid::Uuid::new_v4();
        let bound = ParamBinder::UuidText.bind(Value::Uuid(id)).unwrap();
        assert_eq!(bound, Value::String(id.to_string()));

        let read = ResultReader::for_types(&db::Type::Text, &Type::Uuid)
            .read(bound)
            .unwrap();
        assert_eq!(read, Value::Uuid(id));
    }

    #[test]
    fn numeric_from_float() {
        let reader = ResultReader::for_types(&db::Type::Numeric(None), &Type::Decimal);
        let value = reader.read(Value::F64(12.5)).unwrap();
        assert_eq!(value, Value::Decimal("12.5".parse().unwrap()));
    }

    #[test]
    fn boolean_from_integer() {
        let reader = ResultReader::for_types(&db::Type::Boolean, &Type::Bool);
        assert_eq!(reader.read(Value::I64(1)).unwrap(), Value::Bool(true));
    }
}

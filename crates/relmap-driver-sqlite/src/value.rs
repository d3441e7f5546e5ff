use relmap_core::{
    schema::db,
    stmt::{self, Value as CoreValue},
    Error, Result,
};
use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    /// Converts this SQLite driver value into the core value.
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Converts a SQLite value within a row according to the column's
    /// storage type. Finer conversions are left to the column's reader.
    pub fn from_sql(row: &Row, index: usize, ty: &db::Type) -> Result<Self> {
        let value: SqlValue = row.get(index).map_err(Error::driver_operation_failed)?;

        let core_value = match value {
            SqlValue::Null => CoreValue::Null,
            SqlValue::Integer(value) => match ty {
                db::Type::Boolean => CoreValue::Bool(value != 0),
                db::Type::Integer(width) if *width <= 4 => match i32::try_from(value) {
                    Ok(value) => CoreValue::I32(value),
                    Err(_) => CoreValue::I64(value),
                },
                db::Type::Real => CoreValue::F64(value as f64),
                _ => CoreValue::I64(value),
            },
            SqlValue::Real(value) => CoreValue::F64(value),
            SqlValue::Text(value) => match ty {
                db::Type::Uuid => CoreValue::Uuid(value.parse()?),
                db::Type::Numeric(_) => CoreValue::Decimal(value.parse()?),
                _ => CoreValue::String(value),
            },
            SqlValue::Blob(value) => match ty {
                db::Type::Uuid => CoreValue::Uuid(uuid::Uuid::from_slice(&value)?),
                _ => CoreValue::Bytes(value),
            },
        };

        Ok(Value(core_value))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use stmt::Value;

        match &self.0 {
            Value::Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            Value::Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            Value::I32(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            Value::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            Value::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            // Stored as text to keep every digit
            Value::Decimal(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(v.to_string()))),
            Value::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Value::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            Value::Uuid(v) => Ok(ToSqlOutput::Owned(SqlValue::Blob(v.as_bytes().to_vec()))),
            Value::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            Value::Record(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                Error::type_conversion(self.0.clone(), "column value").into(),
            )),
        }
    }
}

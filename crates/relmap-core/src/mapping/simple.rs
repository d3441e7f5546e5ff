use super::{Column, ValueTransformer};
use crate::{stmt::Value, Result};

/// A field stored in exactly one column.
#[derive(Debug)]
pub struct SimpleMapping {
    column: Column,
    transformer: Option<Box<dyn ValueTransformer>>,
}

impl SimpleMapping {
    pub fn new(column: Column, transformer: Option<Box<dyn ValueTransformer>>) -> Self {
        Self {
            column,
            transformer,
        }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn has_transformer(&self) -> bool {
        self.transformer.is_some()
    }

    /// Field value to column value. Null is never transformed.
    pub fn column_value(&self, field_value: &Value) -> Result<Value> {
        match &self.transformer {
            Some(transformer) if !field_value.is_null() => transformer.to_column(field_value),
            _ => Ok(field_value.clone()),
        }
    }

    /// Column value to field value.
    pub fn field_value(&self, column_value: Value) -> Result<Value> {
        match &self.transformer {
            Some(transformer) if !column_value.is_null() => transformer.to_field(&column_value),
            _ => Ok(column_value),
        }
    }

    pub fn read(&self, raw: Value) -> Result<Value> {
        let column_value = self.column.read(raw)?;
        self.field_value(column_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mapping::CodeTable, stmt::Type};

    fn status() -> SimpleMapping {
        let codes = CodeTable::new()
            .entry("ACTIVE", 1)
            .entry("SUSPENDED", 2)
            .entry("CLOSED", 3);
        SimpleMapping::new(Column::new("status", Type::I32), Some(Box::new(codes)))
    }

    #[test]
    fn transformer_round_trip() {
        let mapping = status();

        for name in ["ACTIVE", "SUSPENDED", "CLOSED"] {
            let field = Value::from(name);
            let column = mapping.column_value(&field).unwrap();
            assert_eq!(mapping.field_value(column).unwrap(), field);
        }

        assert_eq!(
            mapping.column_value(&Value::from("ACTIVE")).unwrap(),
            Value::I32(1)
        );
        assert_eq!(
            mapping.field_value(Value::I32(1)).unwrap(),
            Value::from("ACTIVE")
        );
    }

    #[test]
    fn read_applies_transformer_after_reader() {
        let mapping = status();
        // Drivers return integers as 64-bit
        assert_eq!(mapping.read(Value::I64(2)).unwrap(), Value::from("SUSPENDED"));
        assert!(mapping.read(Value::Null).unwrap().is_null());
    }

    #[test]
    fn unknown_code() {
        let err = status().field_value(Value::I32(9)).unwrap_err();
        assert!(err.is_mapping());
    }
}

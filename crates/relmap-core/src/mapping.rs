//! Maps a logical entity field onto one or more physical columns.
//!
//! A [`ColumnMapping`] is either [`Simple`](ColumnMapping::Simple), one
//! column with an optional [`ValueTransformer`], or
//! [`Decomposed`](ColumnMapping::Decomposed), a value object flattened across
//! several columns through precompiled [`Accessor`] chains. Both variants
//! expose the same capabilities: column metadata, parameter binding, and
//! result reading.

mod accessor;
pub use accessor::Accessor;

mod binder;
pub use binder::{ParamBinder, ResultReader};

mod column;
pub use column::Column;

mod decomposed;
pub use decomposed::{DecomposedMapping, PropertyOverride};

mod simple;
pub use simple::SimpleMapping;

mod transformer;
pub use transformer::{CodeTable, ValueTransformer};

mod value_class;
pub use value_class::{Property, PropertyKind, ValueClass, ValueClasses};

use crate::{
    schema::db,
    stmt::{self, Param, Value},
    Result,
};

#[derive(Debug)]
pub enum ColumnMapping {
    Simple(SimpleMapping),
    Decomposed(DecomposedMapping),
}

impl ColumnMapping {
    /// A single column without a transformer.
    pub fn simple(column: Column) -> ColumnMapping {
        ColumnMapping::Simple(SimpleMapping::new(column, None))
    }

    /// A single column whose values pass through `transformer`.
    pub fn transformed(
        column: Column,
        transformer: impl ValueTransformer + 'static,
    ) -> ColumnMapping {
        ColumnMapping::Simple(SimpleMapping::new(column, Some(Box::new(transformer))))
    }

    /// Flattens the value class `class` into columns prefixed with `column`.
    /// With `not_null`, every flattened column is `NOT NULL`.
    pub fn decomposed(
        column: &str,
        not_null: bool,
        class: &str,
        classes: &ValueClasses,
        overrides: &[PropertyOverride],
    ) -> Result<ColumnMapping> {
        DecomposedMapping::new(column, not_null, class, classes, overrides)
            .map(ColumnMapping::Decomposed)
    }

    pub fn columns(&self) -> &[Column] {
        match self {
            ColumnMapping::Simple(mapping) => std::slice::from_ref(mapping.column()),
            ColumnMapping::Decomposed(mapping) => mapping.columns(),
        }
    }

    /// Number of columns the field occupies.
    pub fn width(&self) -> usize {
        self.columns().len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns().iter().map(|column| &column.name[..])
    }

    pub fn column_types(&self) -> impl Iterator<Item = &stmt::Type> + '_ {
        self.columns().iter().map(|column| &column.ty)
    }

    pub fn storage_types(&self) -> impl Iterator<Item = &db::Type> + '_ {
        self.columns().iter().map(|column| &column.storage_ty)
    }

    pub fn sql_types(&self) -> impl Iterator<Item = String> + '_ {
        self.columns().iter().map(Column::sql_type_name)
    }

    pub fn not_null(&self) -> impl Iterator<Item = bool> + '_ {
        self.columns().iter().map(|column| column.not_null)
    }

    pub fn auto_increment(&self) -> impl Iterator<Item = bool> + '_ {
        self.columns().iter().map(|column| column.auto_increment)
    }

    pub fn binders(&self) -> impl Iterator<Item = ParamBinder> + '_ {
        self.columns().iter().map(|column| column.binder)
    }

    pub fn readers(&self) -> impl Iterator<Item = &ResultReader> + '_ {
        self.columns().iter().map(|column| &column.reader)
    }

    pub fn has_transformer(&self) -> bool {
        match self {
            ColumnMapping::Simple(mapping) => mapping.has_transformer(),
            ColumnMapping::Decomposed(_) => false,
        }
    }

    /// Whether the field can appear in a `WHERE` predicate or a `DISTINCT`
    /// select list.
    pub fn is_searchable(&self) -> bool {
        match self {
            ColumnMapping::Simple(mapping) => mapping.column().is_searchable(),
            ColumnMapping::Decomposed(_) => false,
        }
    }

    /// Extracts the value of column `index` from a field value.
    pub fn column_value(&self, field_value: &Value, index: usize) -> Result<Value> {
        match self {
            ColumnMapping::Simple(mapping) => {
                debug_assert_eq!(index, 0);
                mapping.column_value(field_value)
            }
            ColumnMapping::Decomposed(mapping) => mapping.column_value(field_value, index),
        }
    }

    /// Writes `column_value` into the part of `field_value` backing column
    /// `index`.
    pub fn set_column_value(
        &self,
        field_value: &mut Value,
        index: usize,
        column_value: Value,
    ) -> Result<()> {
        match self {
            ColumnMapping::Simple(mapping) => {
                debug_assert_eq!(index, 0);
                *field_value = mapping.field_value(column_value)?;
                Ok(())
            }
            ColumnMapping::Decomposed(mapping) => {
                mapping.set_column_value(field_value, index, column_value)
            }
        }
    }

    /// Binds column `index` of `field_value`.
    pub fn bind_column(&self, field_value: &Value, index: usize) -> Result<Param> {
        let value = self.column_value(field_value, index)?;
        self.columns()[index].bind(value)
    }

    /// Binds every column of `field_value`, in column order.
    pub fn bind(&self, field_value: &Value, params: &mut Vec<Param>) -> Result<()> {
        for index in 0..self.width() {
            params.push(self.bind_column(field_value, index)?);
        }
        Ok(())
    }

    /// Rebuilds a field value from the raw driver values of its columns.
    pub fn read(&self, row: &[Value]) -> Result<Value> {
        debug_assert_eq!(row.len(), self.width());

        match self {
            ColumnMapping::Simple(mapping) => mapping.read(row[0].clone()),
            ColumnMapping::Decomposed(mapping) => mapping.read(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Type;

    #[test]
    fn simple_capabilities() {
        let mapping = ColumnMapping::simple(Column::new("name", Type::String).not_null());

        assert_eq!(mapping.width(), 1);
        assert_eq!(mapping.column_names().collect::<Vec<_>>(), ["name"]);
        assert_eq!(mapping.not_null().collect::<Vec<_>>(), [true]);
        assert_eq!(mapping.sql_types().collect::<Vec<_>>(), ["TEXT"]);
        assert!(mapping.is_searchable());
        assert!(!mapping.has_transformer());
    }

    #[test]
    fn large_object_is_not_searchable() {
        let mapping = ColumnMapping::simple(Column::new("photo", Type::Bytes));
        assert!(!mapping.is_searchable());

        let mapping =
            ColumnMapping::simple(Column::new("notes", Type::String).storage_ty(db::Type::Clob));
        assert!(!mapping.is_searchable());
    }

    #[test]
    fn null_binds_with_declared_type() {
        let mapping = ColumnMapping::simple(Column::new("price", Type::Decimal));
        let mut params = vec![];
        mapping.bind(&Value::Null, &mut params).unwrap();

        assert_eq!(params, [Param::null(db::Type::Numeric(None))]);
    }

    #[test]
    fn decimal_binds_exact() {
        let mapping = ColumnMapping::simple(Column::new("price", Type::Decimal));
        let price: rust_decimal::Decimal = "19.99".parse().unwrap();
        let param = mapping.bind_column(&Value::Decimal(price), 0).unwrap();

        assert_eq!(param.value, Value::Decimal(price));
    }
}

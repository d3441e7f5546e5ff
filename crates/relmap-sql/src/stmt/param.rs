use relmap_core::{
    err,
    mapping::ColumnMapping,
    stmt::{Param, Value},
    Error, Result,
};

use std::sync::Arc;

/// Describes how one placeholder gets its value from the call arguments.
///
/// The argument is selected by position. When the argument is an entity
/// identity or an entity record, `component` picks the part feeding this
/// placeholder. The value is then split into columns by `mapping` and the
/// `column`th one is bound.
#[derive(Debug, Clone)]
pub struct QueryParameter {
    /// Zero-based argument position
    pub arg: usize,

    pub component: Option<Component>,

    /// Index into the mapping's columns
    pub column: usize,

    pub mapping: Arc<ColumnMapping>,
}

/// Position of a part within a composite argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Key field `index` of an identity with `width` key fields
    Identity { index: usize, width: usize },

    /// Field `index` of an entity record
    Field(usize),
}

impl QueryParameter {
    pub fn new(arg: usize, column: usize, mapping: Arc<ColumnMapping>) -> QueryParameter {
        QueryParameter {
            arg,
            component: None,
            column,
            mapping,
        }
    }

    /// Reads key field `index` of an identity argument.
    pub fn identity(mut self, index: usize, width: usize) -> Self {
        self.component = Some(Component::Identity { index, width });
        self
    }

    /// Reads field `index` of an entity record argument.
    pub fn field(mut self, index: usize) -> Self {
        self.component = Some(Component::Field(index));
        self
    }

    /// Resolves the argument and binds the column value.
    pub fn bind(&self, args: &[Value]) -> Result<Param> {
        let arg = args.get(self.arg).ok_or_else(|| {
            err!(
                "statement parameter refers to argument {} but only {} were supplied",
                self.arg,
                args.len()
            )
        })?;

        let value = match self.component {
            Some(Component::Identity { index, width }) => arg.component(index, width)?,
            Some(Component::Field(index)) => arg
                .as_record()
                .and_then(|record| record.get(index))
                .ok_or_else(|| Error::type_conversion(arg.clone(), "Record"))?,
            None => arg,
        };

        self.mapping.bind_column(value, self.column)
    }
}

/// Binds every parameter against `args`, in placeholder order.
pub(crate) fn bind_all(params: &[QueryParameter], args: &[Value]) -> Result<Vec<Param>> {
    params.iter().map(|param| param.bind(args)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::{mapping::Column, schema::db, stmt::Type};

    fn id_mapping() -> Arc<ColumnMapping> {
        Arc::new(ColumnMapping::simple(Column::new("id", Type::I64)))
    }

    #[test]
    fn binds_plain_argument() {
        let param = QueryParameter::new(1, 0, id_mapping());
        let bound = param.bind(&[Value::from("x"), Value::from(7_i64)]).unwrap();
        assert_eq!(bound.value, Value::I64(7));
        assert_eq!(bound.ty, db::Type::Integer(8));
    }

    #[test]
    fn binds_identity_component() {
        let param = QueryParameter::new(0, 0, id_mapping()).identity(1, 2);
        let identity = Value::record_from_vec(vec![Value::I64(1), Value::I64(2)]);
        assert_eq!(param.bind(&[identity]).unwrap().value, Value::I64(2));

        // Single-field identities are not wrapped
        let param = QueryParameter::new(0, 0, id_mapping()).identity(0, 1);
        assert_eq!(param.bind(&[Value::I64(9)]).unwrap().value, Value::I64(9));
    }

    #[test]
    fn binds_record_field() {
        let param = QueryParameter::new(0, 0, id_mapping()).field(0);
        let record = Value::record_from_vec(vec![Value::I64(4)]);
        assert_eq!(param.bind(&[record]).unwrap().value, Value::I64(4));

        assert!(param.bind(&[Value::I64(4)]).is_err());
    }

    #[test]
    fn missing_argument() {
        let param = QueryParameter::new(2, 0, id_mapping());
        assert!(param.bind(&[Value::I64(1)]).is_err());
    }
}

use crate::{stmt::Value, Error, Result};

/// Converts between a field's value and the value stored in its column.
///
/// `to_field(to_column(x)) == x` must hold for every value the column can
/// hold. `to_column` may be lossy. Implementations must be pure.
pub trait ValueTransformer: std::fmt::Debug + Send + Sync {
    fn to_column(&self, value: &Value) -> Result<Value>;

    fn to_field(&self, value: &Value) -> Result<Value>;
}

/// Maps an enumeration onto stored codes, e.g. `"ACTIVE"` ↔ `1`.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    /// (field value, column code)
    entries: Vec<(Value, Value)>,
}

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, field: impl Into<Value>, code: impl Into<Value>) -> Self {
        self.entries.push((field.into(), code.into()));
        self
    }
}

impl ValueTransformer for CodeTable {
    fn to_column(&self, value: &Value) -> Result<Value> {
        self.entries
            .iter()
            .find(|(field, _)| field == value)
            .map(|(_, code)| code.clone())
            .ok_or_else(|| Error::mapping(format!("no stored code for {value:?}")))
    }

    fn to_field(&self, value: &Value) -> Result<Value> {
        self.entries
            .iter()
            .find(|(_, code)| code == value)
            .map(|(field, _)| field.clone())
            .ok_or_else(|| Error::mapping(format!("unknown stored code {value:?}")))
    }
}

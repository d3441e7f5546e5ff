use crate::{stmt::Value, Error, Result};

use std::{fmt, sync::Arc};

type Getter = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut Value, Value) -> Result<()> + Send + Sync>;

/// Reads and writes one property of a value object.
///
/// Accessors are resolved when a mapping is built and reused for every call.
#[derive(Clone)]
pub struct Accessor {
    get: Getter,
    set: Setter,
}

impl Accessor {
    pub fn new(
        get: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
        set: impl Fn(&mut Value, Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Accesses field `index` of a record value.
    pub fn field(index: usize) -> Self {
        Accessor::new(
            move |value| match value.as_record() {
                Some(record) if index < record.len() => Ok(record[index].clone()),
                _ => Err(shape_error(value, index)),
            },
            move |target, value| {
                if !matches!(target.as_record(), Some(record) if index < record.len()) {
                    return Err(shape_error(target, index));
                }
                if let Some(record) = target.as_record_mut() {
                    record[index] = value;
                }
                Ok(())
            },
        )
    }

    pub fn get(&self, value: &Value) -> Result<Value> {
        (self.get)(value)
    }

    pub fn set(&self, target: &mut Value, value: Value) -> Result<()> {
        (self.set)(target, value)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor")
    }
}

fn shape_error(value: &Value, index: usize) -> Error {
    Error::mapping(format!(
        "expected a record with at least {} fields; value={value:?}",
        index + 1
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_field() {
        let accessor = Accessor::field(1);
        let mut value = Value::record_from_vec(vec![Value::from(1), Value::from("a")]);

        assert_eq!(accessor.get(&value).unwrap(), Value::from("a"));
        accessor.set(&mut value, Value::from("b")).unwrap();
        assert_eq!(
            value,
            Value::record_from_vec(vec![Value::from(1), Value::from("b")])
        );
    }

    #[test]
    fn wrong_shape() {
        let accessor = Accessor::field(3);
        let value = Value::record_from_vec(vec![Value::from(1)]);
        assert!(accessor.get(&value).unwrap_err().is_mapping());
        assert!(accessor.get(&Value::from(1)).unwrap_err().is_mapping());
    }
}

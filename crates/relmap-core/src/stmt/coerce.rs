use super::{Type, Value};
use crate::{Error, Result};

use rust_decimal::prelude::ToPrimitive;

impl Value {
    /// Converts the value to `ty`, widening or reinterpreting where no
    /// information is lost. Null converts to null for every type.
    pub fn coerce(self, ty: &Type) -> Result<Value> {
        use Value::*;

        let value = match (self, ty) {
            (Null, _) => Null,
            (v @ Bool(_), Type::Bool) => v,
            (I32(v), Type::Bool) => Bool(v != 0),
            (I64(v), Type::Bool) => Bool(v != 0),
            (Bool(v), Type::I32) => I32(v as i32),
            (Bool(v), Type::I64) => I64(v as i64),

            (v @ I32(_), Type::I32) => v,
            (v @ I64(_), Type::I64) => v,
            (I32(v), Type::I64) => I64(v as i64),
            (I64(v), Type::I32) => match i32::try_from(v) {
                Ok(v) => I32(v),
                Err(_) => return Err(Error::type_conversion(I64(v), "I32")),
            },

            (v @ F64(_), Type::F64) => v,
            (I32(v), Type::F64) => F64(v as f64),
            (I64(v), Type::F64) => F64(v as f64),
            (Decimal(v), Type::F64) => match v.to_f64() {
                Some(f) => F64(f),
                None => return Err(Error::type_conversion(Decimal(v), "F64")),
            },

            (v @ Decimal(_), Type::Decimal) => v,
            (I32(v), Type::Decimal) => Decimal(v.into()),
            (I64(v), Type::Decimal) => Decimal(v.into()),
            (F64(v), Type::Decimal) => Decimal(rust_decimal::Decimal::try_from(v)?),
            (String(v), Type::Decimal) => match v.parse::<rust_decimal::Decimal>() {
                Ok(d) => Decimal(d),
                Err(_) => return Err(Error::type_conversion(String(v), "Decimal")),
            },
            (Decimal(v), Type::I64) => match v.to_i64() {
                Some(i) if v.fract().is_zero() => I64(i),
                _ => return Err(Error::type_conversion(Decimal(v), "I64")),
            },
            (Decimal(v), Type::I32) => match v.to_i32() {
                Some(i) if v.fract().is_zero() => I32(i),
                _ => return Err(Error::type_conversion(Decimal(v), "I32")),
            },

            (v @ String(_), Type::String) => v,
            (Uuid(v), Type::String) => String(v.to_string()),
            (Decimal(v), Type::String) => String(v.to_string()),
            (Bytes(v), Type::String) => match std::string::String::from_utf8(v) {
                Ok(s) => String(s),
                Err(e) => return Err(Error::type_conversion(Bytes(e.into_bytes()), "String")),
            },

            (v @ Bytes(_), Type::Bytes) => v,
            (String(v), Type::Bytes) => Bytes(v.into_bytes()),
            (Uuid(v), Type::Bytes) => Bytes(v.as_bytes().to_vec()),

            (v @ Uuid(_), Type::Uuid) => v,
            (String(v), Type::Uuid) => Uuid(v.parse()?),
            (Bytes(v), Type::Uuid) => Uuid(uuid::Uuid::from_slice(&v)?),

            (v @ Record(_), Type::Record(_)) => v,

            (v, ty) => return Err(Error::type_conversion(v, ty.name())),
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_and_narrow() {
        assert_eq!(Value::I32(7).coerce(&Type::I64).unwrap(), Value::I64(7));
        assert_eq!(Value::I64(7).coerce(&Type::I32).unwrap(), Value::I32(7));
        assert!(Value::I64(i64::MAX)
            .coerce(&Type::I32)
            .unwrap_err()
            .is_type_conversion());
    }

    #[test]
    fn decimal_stays_exact() {
        let d: rust_decimal::Decimal = "12.345".parse().unwrap();
        assert_eq!(
            Value::from("12.345").coerce(&Type::Decimal).unwrap(),
            Value::Decimal(d)
        );
        assert!(Value::Decimal(d).coerce(&Type::I64).is_err());
    }

    #[test]
    fn uuid_text_round_trip() {
        let id = uuid::Uuid::new_v4();
        let text = Value::Uuid(id).coerce(&Type::String).unwrap();
        assert_eq!(text.coerce(&Type::Uuid).unwrap(), Value::Uuid(id));
    }

    #[test]
    fn null_is_preserved() {
        assert!(Value::Null.coerce(&Type::Decimal).unwrap().is_null());
    }

    #[test]
    fn incompatible() {
        let err = Value::Bool(true).coerce(&Type::Uuid).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert Bool to Uuid");
    }
}

//! Dialect-neutral values used for bound parameters and scanned columns.
//!
//! Every entity field converts into a [`Value`] on the way out (`Into<Value>`) and is rebuilt
//! from one on the way in ([`FromValue`]). `Option<T>` maps to nullable columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

/// A single parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Check if this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Json(_) => "json",
        }
    }
}

/// A value could not be converted into the requested Rust type.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("cannot convert {found} value into {expected}")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ValueError {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.type_name(),
        }
    }
}

/// Rebuild a Rust value from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value> + Clone> From<&T> for Value {
    fn from(value: &T) -> Self {
        value.clone().into()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(v) => Ok(v != 0),
            Value::UInt(v) => Ok(v != 0),
            v => Err(ValueError::new("bool", &v)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! signed_value {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::Int(v) => <$t>::try_from(v).map_err(|_| ValueError::new(stringify!($t), &Value::Int(v))),
                    Value::UInt(v) => <$t>::try_from(v).map_err(|_| ValueError::new(stringify!($t), &Value::UInt(v))),
                    v => Err(ValueError::new(stringify!($t), &v)),
                }
            }
        }
    )*};
}

macro_rules! unsigned_value {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::Int(v) => <$t>::try_from(v).map_err(|_| ValueError::new(stringify!($t), &Value::Int(v))),
                    Value::UInt(v) => <$t>::try_from(v).map_err(|_| ValueError::new(stringify!($t), &Value::UInt(v))),
                    v => Err(ValueError::new(stringify!($t), &v)),
                }
            }
        }
    )*};
}

signed_value!(i8, i16, i32, i64);
unsigned_value!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::UInt(v) => Ok(v as f64),
            v => Err(ValueError::new("f64", &v)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Bytes(v) => String::from_utf8(v).map_err(|_| ValueError {
                expected: "String",
                found: "non-utf8 bytes",
            }),
            v => Err(ValueError::new("String", &v)),
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            v => Err(ValueError::new("Vec<u8>", &v)),
        }
    }
}

macro_rules! simple_value {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    v => Err(ValueError::new(stringify!($t), &v)),
                }
            }
        }
    )*};
}

simple_value!(
    uuid::Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    serde_json::Value => Json,
);

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::TimestampTz(v) => Ok(v.naive_utc()),
            v => Err(ValueError::new("NaiveDateTime", &v)),
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::TimestampTz(v) => Ok(v),
            Value::Timestamp(v) => Ok(v.and_utc()),
            v => Err(ValueError::new("DateTime<Utc>", &v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_narrow_with_range_checks() {
        assert_eq!(i8::from_value(Value::Int(-12)), Ok(-12));
        assert_eq!(u16::from_value(Value::Int(65535)), Ok(65535));
        let err = i8::from_value(Value::Int(300)).unwrap_err();
        assert_eq!(err.expected, "i8");
        assert!(u32::from_value(Value::Int(-1)).is_err());
        assert_eq!(u64::from_value(Value::UInt(u64::MAX)), Ok(u64::MAX));
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i32>::from_value(Value::Int(7)), Ok(Some(7)));
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".to_string()));
    }

    #[test]
    fn non_optional_rejects_null() {
        let err = String::from_value(Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert null value into String");
    }

    #[test]
    fn float_round_trip_keeps_f32_precision() {
        let v = Value::from(1.5f32);
        assert_eq!(f32::from_value(v), Ok(1.5f32));
    }

    #[test]
    fn timestamps_convert_between_naive_and_utc() {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let utc = DateTime::<Utc>::from_value(Value::Timestamp(naive)).unwrap();
        assert_eq!(NaiveDateTime::from_value(Value::TimestampTz(utc)), Ok(naive));
    }
}

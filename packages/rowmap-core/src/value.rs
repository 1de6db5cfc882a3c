//! Runtime field values and conversions to Rust field types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Declared kind of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    DateTime,
    Guid,
    Bytes,
}

impl ValueKind {
    /// Position in the cross-kind sort order.
    fn rank(self) -> u8 {
        match self {
            ValueKind::Bool => 0,
            ValueKind::Int => 1,
            ValueKind::Float => 2,
            ValueKind::Text => 3,
            ValueKind::DateTime => 4,
            ValueKind::Guid => 5,
            ValueKind::Bytes => 6,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::DateTime => "datetime",
            ValueKind::Guid => "guid",
            ValueKind::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

/// A single field or parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the kind of this value, `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::DateTime(_) => Some(ValueKind::DateTime),
            Value::Guid(_) => Some(ValueKind::Guid),
            Value::Bytes(_) => Some(ValueKind::Bytes),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Total order used for sorting: `Null` first, then by kind, then by payload.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Guid(a), Value::Guid(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (a, b) => {
                let rank = |v: &Value| v.kind().map(ValueKind::rank).unwrap_or(0);
                rank(a).cmp(&rank(b))
            }
        }
    }

    /// Converts a loosely typed value into the given kind.
    ///
    /// Text is parsed into `Guid` and `DateTime`, integers widen to `Float`
    /// and `Bool` accepts 0/1. `Null` passes through unchanged.
    pub fn coerce(self, kind: ValueKind) -> Option<Value> {
        if self.kind().map_or(true, |k| k == kind) {
            return Some(self);
        }
        match (self, kind) {
            (Value::Int(i), ValueKind::Float) => Some(Value::Float(i as f64)),
            (Value::Int(i), ValueKind::Bool) if i == 0 || i == 1 => Some(Value::Bool(i == 1)),
            (Value::Bool(b), ValueKind::Int) => Some(Value::Int(i64::from(b))),
            (Value::Text(s), ValueKind::Guid) => Uuid::parse_str(&s).ok().map(Value::Guid),
            (Value::Text(s), ValueKind::DateTime) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Guid(g) => write!(f, "{g}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        use serde::de::Error as _;

        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| D::Error::custom("number out of range")),
            },
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            other => Err(D::Error::custom(format!(
                "expected a scalar value, got {other}"
            ))),
        }
    }
}

/// Conversion between a Rust field type and [`Value`].
pub trait FieldValue: Sized {
    /// Kind this type maps to
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    /// Converts back, returning the rejected value on mismatch.
    fn from_value(value: Value) -> std::result::Result<Self, Value>;
}

/// Converts a value into a field type, naming the field on failure.
pub fn convert<T: FieldValue>(field: &str, value: Value) -> Result<T> {
    T::from_value(value).map_err(|rejected| Error::Mapping {
        field: field.to_string(),
        expected: T::KIND.to_string(),
        got: rejected
            .kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "null".to_string()),
    })
}

macro_rules! int_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                const KIND: ValueKind = ValueKind::Int;

                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }

                fn from_value(value: Value) -> std::result::Result<Self, Value> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| Value::Int(i)),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

int_field_value!(i16, i32, i64, u8, u16, u32);

macro_rules! simple_field_value {
    ($ty:ty, $kind:ident) => {
        impl FieldValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                Value::$kind(self)
            }

            fn from_value(value: Value) -> std::result::Result<Self, Value> {
                match value {
                    Value::$kind(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

simple_field_value!(bool, Bool);
simple_field_value!(String, Text);
simple_field_value!(DateTime<Utc>, DateTime);
simple_field_value!(Uuid, Guid);
simple_field_value!(Vec<u8>, Bytes);

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(other),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn into_value(self) -> Value {
        self.map(T::into_value).unwrap_or(Value::Null)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.into_value()
                }
            }
        )*
    };
}

value_from!(
    bool,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f64,
    String,
    DateTime<Utc>,
    Uuid,
    Vec<u8>
);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: FieldValue> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.into_value()
    }
}

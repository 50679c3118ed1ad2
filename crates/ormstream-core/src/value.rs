//! Operand and bind values.

use crate::config::ScalarType;
use serde::Serialize;
use std::cmp::Ordering;

/// A runtime value compared against a column or bound to a placeholder.
///
/// Field getters produce values and predicates carry them as operands, so
/// the same type drives both in-memory evaluation and SQL parameter binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Try to get as f64, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::Float32(f) => Some(*f as f64),
            Value::Int32(i) => Some(*i as f64),
            Value::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn is_integer(&self) -> bool {
        matches!(self, Value::Int32(_) | Value::Int64(_))
    }

    /// Compare two values of compatible kinds.
    ///
    /// Numeric variants compare across widths. Returns `None` when either
    /// side is null or the kinds are unrelated.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (a, b) if a.is_integer() && b.is_integer() => {
                Some(a.as_i64()?.cmp(&b.as_i64()?))
            }
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Total order used for in-memory sorting. Nulls sort first, unrelated
    /// kinds compare equal so a stable sort keeps their relative order.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.partial_compare(other).unwrap_or(Ordering::Equal),
        }
    }

    /// SQL-style equality: null never equals anything.
    pub fn sql_eq(&self, other: &Value) -> bool {
        matches!(self.partial_compare(other), Some(Ordering::Equal))
    }

    /// Convert this value to the representation of a column type.
    ///
    /// Returns `None` if the value cannot represent the type without loss.
    /// Null converts to every type.
    pub fn coerce_to(&self, ty: &ScalarType) -> Option<Value> {
        let coerced = match (ty, self) {
            (_, Value::Null) => Value::Null,
            (ScalarType::Bool, Value::Bool(b)) => Value::Bool(*b),
            (ScalarType::Int32, Value::Int32(i)) => Value::Int32(*i),
            (ScalarType::Int32, Value::Int64(i)) => Value::Int32(i32::try_from(*i).ok()?),
            (ScalarType::Int64, v) if v.is_integer() => Value::Int64(v.as_i64()?),
            (ScalarType::Float32, Value::Float32(f)) => Value::Float32(*f),
            (ScalarType::Float32, v) if v.is_integer() => Value::Float32(v.as_f64()? as f32),
            (ScalarType::Float64, v) if !matches!(v, Value::Timestamp(_)) => {
                Value::Float64(v.as_f64()?)
            }
            (ScalarType::Decimal { .. }, v) if !matches!(v, Value::Timestamp(_)) => {
                if v.is_integer() {
                    v.clone()
                } else {
                    Value::Float64(v.as_f64()?)
                }
            }
            (ScalarType::String, Value::String(s)) => Value::String(s.clone()),
            (ScalarType::Bytes, Value::Bytes(b)) => Value::Bytes(b.clone()),
            (ScalarType::Timestamp, Value::Timestamp(t)) => Value::Timestamp(*t),
            (ScalarType::Timestamp, v) if v.is_integer() => Value::Timestamp(v.as_i64()?),
            _ => return None,
        };
        Some(coerced)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(t) => write!(f, "TIMESTAMP({})", t),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_compare_across_widths() {
        assert_eq!(
            Value::Int32(3).partial_compare(&Value::Int64(3)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Int32(2).partial_compare(&Value::Float64(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Null.partial_compare(&Value::Int32(1)), None);
        assert_eq!(Value::from("a").partial_compare(&Value::Int32(1)), None);
    }

    #[test]
    fn test_sort_cmp_nulls_first() {
        let mut values = vec![Value::Int32(2), Value::Null, Value::Int32(1)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Value::Null, Value::Int32(1), Value::Int32(2)]);
    }

    #[test]
    fn test_coerce_to_column_types() {
        assert_eq!(
            Value::Int64(7).coerce_to(&ScalarType::Int32),
            Some(Value::Int32(7))
        );
        assert_eq!(Value::Int64(i64::MAX).coerce_to(&ScalarType::Int32), None);
        assert_eq!(
            Value::Int32(7).coerce_to(&ScalarType::Float64),
            Some(Value::Float64(7.0))
        );
        assert_eq!(Value::from("x").coerce_to(&ScalarType::Int64), None);
        assert_eq!(Value::Null.coerce_to(&ScalarType::String), Some(Value::Null));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(4)), Value::Int32(4));
    }

    #[test]
    fn test_display_escapes_strings() {
        assert_eq!(Value::from("O'Hara").to_string(), "'O''Hara'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}

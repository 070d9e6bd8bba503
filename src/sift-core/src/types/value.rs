//! Runtime value representation.

use arrow_array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow_schema::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};

use common_error::{SiftError, SiftResult};

use super::DataType;

/// Runtime value read from a column or produced by a derived column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Str(String),
}

impl Value {
    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub const fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64, widening `Int64`.
    pub const fn as_float64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the type kind of this value.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Str(_) => DataType::Str,
        }
    }

    /// Read a value out of an arrow array element.
    ///
    /// Returns `None` for out-of-bounds indices or unsupported array types;
    /// null slots read as [`Value::Null`].
    pub fn from_array(array: &ArrayRef, index: usize) -> Option<Self> {
        if index >= array.len() {
            return None;
        }
        if array.is_null(index) {
            return Some(Self::Null);
        }

        match array.data_type() {
            ArrowDataType::Boolean => {
                let bools = array.as_any().downcast_ref::<BooleanArray>()?;
                Some(Self::Bool(bools.value(index)))
            }
            ArrowDataType::Int64 => {
                let ints = array.as_any().downcast_ref::<Int64Array>()?;
                Some(Self::Int64(ints.value(index)))
            }
            ArrowDataType::Float64 => {
                let floats = array.as_any().downcast_ref::<Float64Array>()?;
                Some(Self::Float64(floats.value(index)))
            }
            ArrowDataType::Utf8 => {
                let strings = array.as_any().downcast_ref::<StringArray>()?;
                Some(Self::Str(strings.value(index).to_string()))
            }
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int64(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// Typed extraction of a [`Value`] read from a named column.
///
/// This is the cast point of the engine: callables declare their input types
/// through their signatures, and the first mismatching access during a pass
/// surfaces as [`SiftError::TypeMismatch`] naming the column and both kinds.
pub trait FromValue: Sized {
    /// Type kind name used in mismatch diagnostics.
    fn expected_kind() -> &'static str;

    /// Extract a typed view of `value`, read from `column`.
    fn from_value(value: &Value, column: &str) -> SiftResult<Self>;
}

impl FromValue for bool {
    fn expected_kind() -> &'static str {
        "Bool"
    }

    fn from_value(value: &Value, column: &str) -> SiftResult<Self> {
        value.as_bool().ok_or_else(|| {
            SiftError::type_mismatch(column, Self::expected_kind(), value.data_type().display_name())
        })
    }
}

impl FromValue for i64 {
    fn expected_kind() -> &'static str {
        "Int64"
    }

    fn from_value(value: &Value, column: &str) -> SiftResult<Self> {
        value.as_int64().ok_or_else(|| {
            SiftError::type_mismatch(column, Self::expected_kind(), value.data_type().display_name())
        })
    }
}

impl FromValue for f64 {
    fn expected_kind() -> &'static str {
        "Float64"
    }

    fn from_value(value: &Value, column: &str) -> SiftResult<Self> {
        value.as_float64().ok_or_else(|| {
            SiftError::type_mismatch(column, Self::expected_kind(), value.data_type().display_name())
        })
    }
}

impl FromValue for String {
    fn expected_kind() -> &'static str {
        "Str"
    }

    fn from_value(value: &Value, column: &str) -> SiftResult<Self> {
        value.as_str().map(str::to_string).ok_or_else(|| {
            SiftError::type_mismatch(column, Self::expected_kind(), value.data_type().display_name())
        })
    }
}

impl FromValue for Value {
    fn expected_kind() -> &'static str {
        "Value"
    }

    fn from_value(value: &Value, _column: &str) -> SiftResult<Self> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42i64).as_int64(), Some(42));
        assert_eq!(Value::from(2.5f64).as_float64(), Some(2.5));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(Value::Int64(3).as_float64(), Some(3.0));
        assert_eq!(f64::from_value(&Value::Int64(3), "x").unwrap(), 3.0);
    }

    #[test]
    fn test_from_value_mismatch() {
        let err = i64::from_value(&Value::Float64(1.5), "pt").unwrap_err();
        assert!(matches!(err, SiftError::TypeMismatch(_)));
        assert!(err.to_string().contains("pt"));
        assert!(err.to_string().contains("Int64"));
        assert!(err.to_string().contains("Float64"));
    }

    #[test]
    fn test_from_array() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        assert_eq!(Value::from_array(&ints, 1), Some(Value::Int64(2)));
        assert_eq!(Value::from_array(&ints, 3), None);

        let nullable: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), None]));
        assert_eq!(Value::from_array(&nullable, 1), Some(Value::Null));

        let strings: ArrayRef = Arc::new(StringArray::from(vec!["a", "b"]));
        assert_eq!(Value::from_array(&strings, 0), Some(Value::Str("a".into())));
    }
}

//! Data type kinds for source and derived columns.

use arrow_schema::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};

/// Type kind of a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Null type (unknown or absent).
    Null,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    Str,
}

impl DataType {
    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }

    /// Get the display name for this type.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool => "Bool",
            Self::Int64 => "Int64",
            Self::Float64 => "Float64",
            Self::Str => "Str",
        }
    }

    /// Map an arrow type to a sift type kind, if supported.
    pub fn from_arrow(arrow: &ArrowDataType) -> Option<Self> {
        match arrow {
            ArrowDataType::Null => Some(Self::Null),
            ArrowDataType::Boolean => Some(Self::Bool),
            ArrowDataType::Int64 => Some(Self::Int64),
            ArrowDataType::Float64 => Some(Self::Float64),
            ArrowDataType::Utf8 => Some(Self::Str),
            _ => None,
        }
    }

    /// Check if this type can be widened to another type.
    ///
    /// The only widening supported is `Int64` to `Float64`.
    pub fn can_widen_to(&self, target: &Self) -> bool {
        self == target || matches!((self, target), (Self::Int64, Self::Float64))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening() {
        assert!(DataType::Int64.can_widen_to(&DataType::Float64));
        assert!(DataType::Float64.can_widen_to(&DataType::Float64));
        assert!(!DataType::Float64.can_widen_to(&DataType::Int64));
        assert!(!DataType::Str.can_widen_to(&DataType::Int64));
    }

    #[test]
    fn test_arrow_mapping() {
        assert_eq!(
            DataType::from_arrow(&ArrowDataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(
            DataType::from_arrow(&ArrowDataType::Utf8),
            Some(DataType::Str)
        );
        assert_eq!(DataType::from_arrow(&ArrowDataType::Int8), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Float64.to_string(), "Float64");
    }
}

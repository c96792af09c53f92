//! Value and `DataType` definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Types carried by shaping-tree nodes and bound references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Date (stored as days since epoch).
    Date,
    /// Timestamp (stored as microseconds since epoch).
    Timestamp,
    /// Row slice backing one entity's materialization.
    ValueBuffer,
    /// Mapped entity type.
    Entity(String),
    /// Client-side object type (anonymous or named).
    Object(String),
    /// Sequence of a single element type.
    Enumerable(Box<DataType>),
}

impl DataType {
    /// Returns whether the store can hold and return values of this type.
    #[must_use]
    pub fn is_store_type(&self) -> bool {
        matches!(
            self,
            DataType::Int64
                | DataType::Float32
                | DataType::Float64
                | DataType::Bool
                | DataType::String
                | DataType::Date
                | DataType::Timestamp
        )
    }

    /// Returns whether this type is an enumerable of one element type.
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        matches!(self, DataType::Enumerable(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => f.write_str("INT64"),
            DataType::Float32 => f.write_str("FLOAT32"),
            DataType::Float64 => f.write_str("FLOAT64"),
            DataType::Bool => f.write_str("BOOL"),
            DataType::String => f.write_str("STRING"),
            DataType::Date => f.write_str("DATE"),
            DataType::Timestamp => f.write_str("TIMESTAMP"),
            DataType::ValueBuffer => f.write_str("VALUE_BUFFER"),
            DataType::Entity(name) | DataType::Object(name) => f.write_str(name),
            DataType::Enumerable(element) => write!(f, "ENUMERABLE<{element}>"),
        }
    }
}

/// Runtime value container for constants and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer value.
    Int64(i64),
    /// 32-bit floating point value.
    Float32(f32),
    /// 64-bit floating point value.
    Float64(f64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    String(String),
    /// Date value (days since Unix epoch).
    Date(i32),
    /// Timestamp value (microseconds since Unix epoch).
    Timestamp(i64),
    /// Null value.
    Null,
}

// Manual Hash implementation because f32/f64 doesn't implement Hash
impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int64(v) | Value::Timestamp(v) => v.hash(state),
            Value::Float32(v) => v.to_bits().hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::Bool(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::Null => {}
        }
    }
}

// Floats compare by bit pattern, matching Hash: NaN equals itself and
// 0.0 differs from -0.0.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) | (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the data type of this value, or None for Null.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float32(_) => Some(DataType::Float32),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Bool(_) => Some(DataType::Bool),
            Value::String(_) => Some(DataType::String),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Null => None,
        }
    }

    /// Returns true if this value can stand in for a value of `data_type`.
    ///
    /// Null is accepted for every type.
    #[must_use]
    pub fn conforms_to(&self, data_type: &DataType) -> bool {
        self.data_type().map_or(true, |own| &own == data_type)
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) | Value::Timestamp(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => f.write_str(if *v { "TRUE" } else { "FALSE" }),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Date(v) => write!(f, "DATE {v}"),
            Value::Null => f.write_str("NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_types() {
        assert!(DataType::Int64.is_store_type());
        assert!(DataType::String.is_store_type());
        assert!(!DataType::ValueBuffer.is_store_type());
        assert!(!DataType::Object("Address".into()).is_store_type());
        assert!(!DataType::Enumerable(Box::new(DataType::Int64)).is_store_type());
    }

    #[test]
    fn test_enumerable_type() {
        let ty = DataType::Enumerable(Box::new(DataType::Entity("Order".into())));
        assert!(ty.is_enumerable());
        assert_eq!(ty.to_string(), "ENUMERABLE<Order>");
    }

    #[test]
    fn test_value_conforms_to() {
        assert!(Value::Int64(1).conforms_to(&DataType::Int64));
        assert!(!Value::Int64(1).conforms_to(&DataType::String));
        assert!(Value::Null.conforms_to(&DataType::Object("Address".into())));
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_ne!(Value::Float64(0.0), Value::Float64(-0.0));
        assert_ne!(Value::Int64(1), Value::Timestamp(1));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_string_literal_display_escapes_quotes() {
        assert_eq!(Value::String("O'Brien".into()).to_string(), "'O''Brien'");
    }
}

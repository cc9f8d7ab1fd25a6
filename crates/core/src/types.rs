//! Data type definitions for the Tally data engine.
//!
//! This module defines the column types a schema can declare.

use serde::{Deserialize, Serialize};

/// Supported column data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// RFC 4122 UUID
    Uuid,
    /// Arbitrary JSON document
    Json,
}

impl DataType {
    /// Returns the lowercase name used in error messages and persisted schemas.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::DateTime => "date_time",
            DataType::Uuid => "uuid",
            DataType::Json => "json",
        }
    }

    /// Returns whether values of this type are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Returns whether this type can be used as an index key.
    pub fn is_indexable(&self) -> bool {
        !matches!(self, DataType::Json)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_equality() {
        assert_eq!(DataType::Int64, DataType::Int64);
        assert_ne!(DataType::Int64, DataType::Float64);
    }

    #[test]
    fn test_numeric() {
        assert!(DataType::Int64.is_numeric());
        assert!(DataType::Float64.is_numeric());
        assert!(!DataType::String.is_numeric());
        assert!(!DataType::DateTime.is_numeric());
    }

    #[test]
    fn test_indexable() {
        assert!(DataType::Boolean.is_indexable());
        assert!(DataType::String.is_indexable());
        assert!(DataType::Uuid.is_indexable());
        assert!(!DataType::Json.is_indexable());
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&DataType::DateTime).unwrap();
        assert_eq!(json, "\"date_time\"");
        let back: DataType = serde_json::from_str("\"uuid\"").unwrap();
        assert_eq!(back, DataType::Uuid);
    }
}

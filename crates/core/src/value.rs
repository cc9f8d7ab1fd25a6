//! Value type definitions for the Tally data engine.
//!
//! This module defines the `Value` enum which represents any value that can be stored
//! in a row cell.

use crate::types::DataType;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use uuid::Uuid;

/// A JSON document stored in a `Json` column.
///
/// Equality, hashing and ordering use the canonical serialized text, so two documents
/// with the same content always land in the same index bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonValue(pub serde_json::Value);

impl JsonValue {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the canonical text form.
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl Eq for JsonValue {}

impl Hash for JsonValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for JsonValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

/// A value that can be stored in a row cell.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// DateTime stored as Unix timestamp in milliseconds
    DateTime(i64),
    /// UUID
    Uuid(Uuid),
    /// JSON document
    Json(JsonValue),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Uuid(_) => Some(DataType::Uuid),
            Value::Json(_) => Some(DataType::Json),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for `Int64` and `Float64` values.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Float64(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the numeric value as f64 for either numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<i64> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(&v.0),
            _ => None,
        }
    }

    /// Converts this value so it can be stored in a column of type `dt`.
    ///
    /// Integers widen to floats and strings parse into UUIDs; any other mismatch
    /// returns `None`. `Null` is returned unchanged.
    pub fn coerce_to(self, dt: DataType) -> Option<Value> {
        match (self, dt) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Int64(i), DataType::Float64) => Some(Value::Float64(i as f64)),
            (Value::String(s), DataType::Uuid) => Uuid::parse_str(&s).ok().map(Value::Uuid),
            (v, dt) if v.data_type() == Some(dt) => Some(v),
            _ => None,
        }
    }

    /// Value equality where numbers compare numerically across variants.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self.is_numeric() && other.is_numeric() {
            self.cmp(other) == Ordering::Equal
        } else {
            self == other
        }
    }

    /// Returns true when `self` and `other` can be ordered against each other by a
    /// comparison operator: both numbers, both strings, or both date-times.
    pub fn is_comparable_with(&self, other: &Value) -> bool {
        matches!(
            (self, other),
            (Value::Int64(_) | Value::Float64(_), Value::Int64(_) | Value::Float64(_))
                | (Value::String(_), Value::String(_))
                | (Value::DateTime(_), Value::DateTime(_))
        )
    }

    /// Returns a type ordering value for comparing different types.
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int64(_) | Value::Float64(_) => 2,
            Value::String(_) => 3,
            Value::DateTime(_) => 4,
            Value::Uuid(_) => 5,
            Value::Json(_) => 6,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Bits hashed for a float. Values that compare equal (`0.0` and `-0.0`, any
/// two NaNs) hash the same.
fn float_hash_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => float_hash_bits(*f).hash(state),
            Value::String(s) => s.hash(state),
            Value::DateTime(d) => d.hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Json(j) => j.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Int64(a), Value::Float64(b)) => compare_f64(*a as f64, *b),
            (Value::Float64(a), Value::Int64(b)) => compare_f64(*a, *b as f64),
            (Value::Float64(a), Value::Float64(b)) => compare_f64(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Json(a), Value::Json(b)) => a.cmp(b),
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

/// NaN sorts after every other number.
fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::DateTime(v) => write!(f, "@{}", v),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v.0),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
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

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(JsonValue(v))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null() {
        let v = Value::Null;
        assert_eq!(v.data_type(), None);
        assert!(v.is_null());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Int64(100).as_i64(), Some(100));
        assert_eq!(Value::Int64(2).as_f64(), Some(2.0));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::DateTime(1234567890).as_datetime(), Some(1234567890));
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::Int64(1) < Value::Int64(2));
        assert!(Value::Int64(1) < Value::Float64(1.5));
        assert!(Value::Float64(f64::NAN) > Value::Int64(i64::MAX));
        assert!(Value::String("a".into()) < Value::String("b".into()));
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Boolean(true) < Value::Int64(0));
    }

    #[test]
    fn test_equal_floats_hash_alike() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(v: &Value) -> u64 {
            let mut hasher = DefaultHasher::new();
            v.hash(&mut hasher);
            hasher.finish()
        }

        assert_eq!(Value::Float64(0.0), Value::Float64(-0.0));
        assert_eq!(hash_of(&Value::Float64(0.0)), hash_of(&Value::Float64(-0.0)));
        let other_nan = f64::from_bits(f64::NAN.to_bits() | 1);
        assert_eq!(hash_of(&Value::Float64(f64::NAN)), hash_of(&Value::Float64(other_nan)));

        let mut rows = std::collections::HashMap::new();
        rows.insert(Value::Float64(0.0), "zero");
        assert_eq!(rows.get(&Value::Float64(-0.0)), Some(&"zero"));
    }

    #[test]
    fn test_loose_numeric_equality() {
        assert_ne!(Value::Int64(3), Value::Float64(3.0));
        assert!(Value::Int64(3).loosely_equals(&Value::Float64(3.0)));
        assert!(!Value::Int64(3).loosely_equals(&Value::String("3".into())));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Int64(2).coerce_to(DataType::Float64), Some(Value::Float64(2.0)));
        assert_eq!(Value::Null.coerce_to(DataType::Uuid), Some(Value::Null));
        assert_eq!(Value::Boolean(true).coerce_to(DataType::Int64), None);

        let id = Uuid::new_v4();
        assert_eq!(
            Value::String(id.to_string()).coerce_to(DataType::Uuid),
            Some(Value::Uuid(id))
        );
        assert_eq!(Value::String("nope".into()).coerce_to(DataType::Uuid), None);
    }

    #[test]
    fn test_json_canonical_ordering() {
        let a = Value::from(serde_json::json!({"b": 1, "a": 2}));
        let b = Value::from(serde_json::json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_value_from_impls() {
        let v: Value = 42i32.into();
        assert_eq!(v.as_i64(), Some(42));

        let v: Value = Some("x").into();
        assert_eq!(v.as_str(), Some("x"));

        let v: Value = None::<i64>.into();
        assert!(v.is_null());
    }
}

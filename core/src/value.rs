//! Dynamic cell values.
//!
//! The record store is schema-aware but not statically typed: a table's
//! columns are configuration, not Rust struct fields. [`Value`] is the cell
//! type used for inserted fields, search filters, query parameters and event
//! payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value in a record, filter or event payload.
///
/// Mirrors the SQLite storage classes the store reads back: `NULL`,
/// `INTEGER`, `REAL` and `TEXT`.
///
/// # Examples
///
/// ```
/// use vendstack_core::Value;
///
/// let quantity = Value::from(10);
/// assert_eq!(quantity.as_i64(), Some(10));
///
/// let name = Value::from("Coke");
/// assert_eq!(name.as_str(), Some("Coke"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
}

impl Value {
    /// Returns the integer value, if this is an [`Value::Integer`].
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value as a float.
    ///
    /// Integers widen to `f64`; text and null return `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the text value, if this is a [`Value::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accessors() {
        let v = Value::from(42);
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_f64(), Some(42.0));
        assert_eq!(v.as_str(), None);
        assert!(!v.is_null());
    }

    #[test]
    fn text_accessors() {
        let v = Value::from("VM1");
        assert_eq!(v.as_str(), Some("VM1"));
        assert_eq!(v.as_i64(), None);
    }

    #[test]
    fn option_maps_to_null() {
        let v = Value::from(None::<i64>);
        assert!(v.is_null());
        let v = Value::from(Some(3));
        assert_eq!(v, Value::Integer(3));
    }

    #[test]
    fn display_formats_plain_values() {
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from("Coke").to_string(), "Coke");
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn serializes_without_a_variant_tag() {
        let json = serde_json::to_string(&Value::from("Coke")).expect("text should serialize");
        assert_eq!(json, r#""Coke""#);
        let back: Value = serde_json::from_str("10").expect("integer should deserialize");
        assert_eq!(back, Value::Integer(10));
    }
}

//! Row representation returned by the record store.

use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Field name → value mapping used for inserts, updates and search filters.
///
/// A `BTreeMap` keeps column order deterministic, which keeps generated SQL
/// stable across runs.
pub type FieldValues = BTreeMap<String, Value>;

/// A single persisted row.
///
/// The identifier is assigned exactly once, at insert time, by the store —
/// never by the caller. `fields` holds every column of the row, including the
/// identifier column itself.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    /// The value of the table's identifier column.
    pub id: String,
    /// All column values for the row, keyed by column name.
    pub fields: FieldValues,
}

impl Record {
    /// Create a record from an identifier and its field values.
    #[must_use]
    pub const fn new(id: String, fields: FieldValues) -> Self {
        Self { id, fields }
    }

    /// Look up a single column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Integer value of a column, if present and integral.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.fields.get(column).and_then(Value::as_i64)
    }

    /// Text value of a column, if present and textual.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_read_fields() {
        let mut fields = FieldValues::new();
        fields.insert("id".to_string(), Value::from("abc"));
        fields.insert("quantity".to_string(), Value::from(10));
        let record = Record::new("abc".to_string(), fields);

        assert_eq!(record.get_str("id"), Some("abc"));
        assert_eq!(record.get_i64("quantity"), Some(10));
        assert_eq!(record.get("missing"), None);
    }
}

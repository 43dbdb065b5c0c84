//! Static per-table configuration.
//!
//! A [`TableSchema`] is created once, when the owning record store is
//! constructed, and only changes through the explicit schema-migration
//! operations (`add_column` / `rename_column` / `drop_column`), which the
//! store calls in lockstep with the physical `ALTER TABLE` so the in-memory
//! column list never drifts from the table.

use crate::error::{CoreError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Column name used for the automatic creation timestamp.
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Schema for one logical table: name, ordered columns, identifier column,
/// immutable columns and foreign-key declarations.
///
/// The identifier column (default `"id"`) and the creation-timestamp column
/// are always immutable; further business columns can be marked immutable
/// with [`TableSchema::with_immutable`].
///
/// # Examples
///
/// ```
/// use vendstack_core::TableSchema;
///
/// let schema = TableSchema::new("products", ["name", "price", "quantity", "vending_machine_id"])
///     .with_foreign_key("vending_machine_id", "vending_machines");
///
/// assert_eq!(schema.id_column(), "id");
/// assert!(schema.is_immutable("id"));
/// assert!(!schema.is_immutable("quantity"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: Vec<String>,
    id_column: String,
    immutable: BTreeSet<String>,
    foreign_keys: BTreeMap<String, String>,
}

impl TableSchema {
    /// Create a schema with the default `"id"` identifier column.
    ///
    /// The identifier column is prepended to `columns` if not already listed,
    /// and both it and `created_at` (when present) are marked immutable.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let id_column = "id".to_string();
        if !columns.iter().any(|c| *c == id_column) {
            columns.insert(0, id_column.clone());
        }
        let mut immutable = BTreeSet::new();
        immutable.insert(id_column.clone());
        if columns.iter().any(|c| c == CREATED_AT_COLUMN) {
            immutable.insert(CREATED_AT_COLUMN.to_string());
        }
        Self {
            name: name.into(),
            columns,
            id_column,
            immutable,
            foreign_keys: BTreeMap::new(),
        }
    }

    /// Use a non-default identifier column, replacing the default `"id"`.
    #[must_use]
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        let old_id = self.id_column.clone();
        self.immutable.remove(&old_id);
        self.columns.retain(|c| *c != old_id);
        if !self.columns.iter().any(|c| *c == column) {
            self.columns.insert(0, column.clone());
        }
        self.immutable.insert(column.clone());
        self.id_column = column;
        self
    }

    /// Mark an additional column immutable.
    #[must_use]
    pub fn with_immutable(mut self, column: impl Into<String>) -> Self {
        self.immutable.insert(column.into());
        self
    }

    /// Declare that `column` references the identifier column of `table`.
    ///
    /// The reference is enforced at the application layer by the registry,
    /// not by a physical constraint, so independently configured stores keep
    /// working against the same database.
    #[must_use]
    pub fn with_foreign_key(
        mut self,
        column: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        self.foreign_keys.insert(column.into(), table.into());
        self
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier column name.
    #[must_use]
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Ordered column list.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether `column` is part of this schema.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Whether `column` is protected from updates.
    #[must_use]
    pub fn is_immutable(&self, column: &str) -> bool {
        self.immutable.contains(column)
    }

    /// The set of immutable columns.
    #[must_use]
    pub const fn immutable_columns(&self) -> &BTreeSet<String> {
        &self.immutable
    }

    /// Foreign-key declarations, `column -> referenced table`.
    #[must_use]
    pub const fn foreign_keys(&self) -> &BTreeMap<String, String> {
        &self.foreign_keys
    }

    /// Record a newly added column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the column already exists.
    pub fn add_column(&mut self, column: &str) -> Result<()> {
        if self.has_column(column) {
            return Err(CoreError::validation(format!(
                "column '{column}' already exists in table '{}'",
                self.name
            )));
        }
        self.columns.push(column.to_string());
        Ok(())
    }

    /// Record a column rename, carrying immutability and foreign-key
    /// declarations over to the new name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `old` is the identifier column
    /// ("cannot modify identifier column"), if `old` does not exist, or if
    /// `new` already exists.
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        if old == self.id_column {
            return Err(CoreError::validation("cannot modify identifier column"));
        }
        if self.has_column(new) {
            return Err(CoreError::validation(format!(
                "column '{new}' already exists in table '{}'",
                self.name
            )));
        }
        let Some(position) = self.columns.iter().position(|c| c == old) else {
            return Err(CoreError::validation(format!(
                "column '{old}' does not exist in table '{}'",
                self.name
            )));
        };
        self.columns[position] = new.to_string();
        if self.immutable.remove(old) {
            self.immutable.insert(new.to_string());
        }
        if let Some(referenced) = self.foreign_keys.remove(old) {
            self.foreign_keys.insert(new.to_string(), referenced);
        }
        Ok(())
    }

    /// Record a dropped column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the column is the identifier
    /// column or does not exist.
    pub fn drop_column(&mut self, column: &str) -> Result<()> {
        if column == self.id_column {
            return Err(CoreError::validation("cannot modify identifier column"));
        }
        let Some(position) = self.columns.iter().position(|c| c == column) else {
            return Err(CoreError::validation(format!(
                "column '{column}' does not exist in table '{}'",
                self.name
            )));
        };
        self.columns.remove(position);
        self.immutable.remove(column);
        self.foreign_keys.remove(column);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn products() -> TableSchema {
        TableSchema::new(
            "products",
            ["name", "price", "quantity", "vending_machine_id", "created_at"],
        )
        .with_foreign_key("vending_machine_id", "vending_machines")
    }

    #[test]
    fn identifier_and_timestamp_are_always_immutable() {
        let schema = products();
        assert_eq!(schema.columns()[0], "id");
        assert!(schema.is_immutable("id"));
        assert!(schema.is_immutable("created_at"));
        assert!(!schema.is_immutable("price"));
    }

    #[test]
    fn rename_of_identifier_column_is_rejected() {
        let mut schema = products();
        let err = schema.rename_column("id", "pk").expect_err("must fail");
        assert!(err.to_string().contains("cannot modify identifier column"));
    }

    #[test]
    fn rename_carries_foreign_key_and_immutability() {
        let mut schema = products().with_immutable("name");
        schema
            .rename_column("vending_machine_id", "machine_id")
            .expect("rename should succeed");
        assert_eq!(
            schema.foreign_keys().get("machine_id").map(String::as_str),
            Some("vending_machines")
        );
        schema.rename_column("name", "title").expect("rename should succeed");
        assert!(schema.is_immutable("title"));
        assert!(!schema.is_immutable("name"));
    }

    #[test]
    fn add_and_drop_keep_column_list_consistent() {
        let mut schema = products();
        schema.add_column("calories").expect("add should succeed");
        assert!(schema.has_column("calories"));
        assert!(schema.add_column("calories").is_err());

        schema.drop_column("calories").expect("drop should succeed");
        assert!(!schema.has_column("calories"));
        assert!(schema.drop_column("calories").is_err());
        assert!(schema.drop_column("id").is_err());
    }

    #[test]
    fn custom_id_column_replaces_default() {
        let schema = TableSchema::new("legacy", ["code", "name"]).with_id_column("code");
        assert_eq!(schema.id_column(), "code");
        assert!(schema.is_immutable("code"));
    }
}

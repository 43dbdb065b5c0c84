//! The vending-commerce table catalog.
//!
//! One entry per logical table: schema (columns, immutable columns,
//! foreign-key declarations) and the DDL the registry runs at startup.
//! Declared once, at registry construction; later schema changes go through
//! the store's explicit migration operations.

use vendstack_core::TableSchema;

/// Products offered by a vending machine.
pub const PRODUCTS: &str = "products";
/// Customer accounts.
pub const USERS: &str = "users";
/// Machine-owner accounts.
pub const OWNERS: &str = "owners";
/// The machines themselves.
pub const VENDING_MACHINES: &str = "vending_machines";
/// Customer comments on a machine.
pub const COMMENTS: &str = "comments";
/// Customer complaints about a machine.
pub const COMPLAINTS: &str = "complaints";
/// Recorded purchases.
pub const PURCHASE_TRANSACTIONS: &str = "purchase_transactions";
/// A user's favorite products.
pub const FAVORITES: &str = "favorites";

/// Schema plus startup DDL for one logical table.
pub struct TableDefinition {
    /// The in-memory schema handed to the table's record store.
    pub schema: TableSchema,
    /// `CREATE TABLE` statement run (once) at registry startup.
    pub ddl: &'static str,
}

/// Every table the registry manages.
///
/// Foreign keys are declared here and enforced by the registry before each
/// insert; the DDL deliberately carries no `REFERENCES` clauses so the
/// stores stay independently configurable.
#[must_use]
pub fn definitions() -> Vec<TableDefinition> {
    vec![
        TableDefinition {
            schema: TableSchema::new(
                OWNERS,
                ["username", "password", "email", "created_at"],
            )
            .with_immutable("username"),
            ddl: "CREATE TABLE owners (\
                  id TEXT PRIMARY KEY, \
                  username TEXT NOT NULL, \
                  password TEXT NOT NULL, \
                  email TEXT, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(
                USERS,
                ["username", "password", "email", "created_at"],
            )
            .with_immutable("username"),
            ddl: "CREATE TABLE users (\
                  id TEXT PRIMARY KEY, \
                  username TEXT NOT NULL, \
                  password TEXT NOT NULL, \
                  email TEXT, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(
                VENDING_MACHINES,
                ["name", "location", "owner_id", "created_at"],
            )
            .with_foreign_key("owner_id", OWNERS),
            ddl: "CREATE TABLE vending_machines (\
                  id TEXT PRIMARY KEY, \
                  name TEXT NOT NULL, \
                  location TEXT, \
                  owner_id TEXT NOT NULL, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(
                PRODUCTS,
                ["name", "price", "quantity", "vending_machine_id", "created_at"],
            )
            .with_foreign_key("vending_machine_id", VENDING_MACHINES),
            ddl: "CREATE TABLE products (\
                  id TEXT PRIMARY KEY, \
                  name TEXT NOT NULL, \
                  price REAL NOT NULL, \
                  quantity INTEGER NOT NULL, \
                  vending_machine_id TEXT NOT NULL, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(
                COMMENTS,
                ["user_id", "vending_machine_id", "content", "created_at"],
            )
            .with_foreign_key("user_id", USERS)
            .with_foreign_key("vending_machine_id", VENDING_MACHINES),
            ddl: "CREATE TABLE comments (\
                  id TEXT PRIMARY KEY, \
                  user_id TEXT NOT NULL, \
                  vending_machine_id TEXT NOT NULL, \
                  content TEXT NOT NULL, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(
                COMPLAINTS,
                ["user_id", "vending_machine_id", "content", "created_at"],
            )
            .with_foreign_key("user_id", USERS)
            .with_foreign_key("vending_machine_id", VENDING_MACHINES),
            ddl: "CREATE TABLE complaints (\
                  id TEXT PRIMARY KEY, \
                  user_id TEXT NOT NULL, \
                  vending_machine_id TEXT NOT NULL, \
                  content TEXT NOT NULL, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(
                PURCHASE_TRANSACTIONS,
                [
                    "user_id",
                    "product_id",
                    "vending_machine_id",
                    "name",
                    "quantity",
                    "price",
                    "created_at",
                ],
            )
            .with_foreign_key("user_id", USERS)
            .with_foreign_key("product_id", PRODUCTS)
            .with_foreign_key("vending_machine_id", VENDING_MACHINES),
            ddl: "CREATE TABLE purchase_transactions (\
                  id TEXT PRIMARY KEY, \
                  user_id TEXT NOT NULL, \
                  product_id TEXT NOT NULL, \
                  vending_machine_id TEXT NOT NULL, \
                  name TEXT NOT NULL, \
                  quantity INTEGER NOT NULL, \
                  price REAL NOT NULL, \
                  created_at TEXT NOT NULL)",
        },
        TableDefinition {
            schema: TableSchema::new(FAVORITES, ["user_id", "product_id", "created_at"])
                .with_foreign_key("user_id", USERS)
                .with_foreign_key("product_id", PRODUCTS),
            ddl: "CREATE TABLE favorites (\
                  id TEXT PRIMARY KEY, \
                  user_id TEXT NOT NULL, \
                  product_id TEXT NOT NULL, \
                  created_at TEXT NOT NULL)",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendstack_store::sql::table_name_from_ddl;

    #[test]
    fn every_definition_names_itself_consistently() {
        for definition in definitions() {
            let from_ddl = table_name_from_ddl(definition.ddl)
                .unwrap_or_else(|_| panic!("DDL for {} must parse", definition.schema.name()));
            assert_eq!(from_ddl, definition.schema.name());
        }
    }

    #[test]
    fn foreign_keys_reference_known_tables() {
        let names: Vec<String> = definitions()
            .iter()
            .map(|d| d.schema.name().to_string())
            .collect();
        for definition in definitions() {
            for referenced in definition.schema.foreign_keys().values() {
                assert!(names.contains(referenced), "unknown table {referenced}");
            }
        }
    }

    #[test]
    fn identifier_and_timestamp_are_immutable_everywhere() {
        for definition in definitions() {
            assert!(definition.schema.is_immutable("id"));
            assert!(definition.schema.is_immutable("created_at"));
        }
    }
}

//! Generic CRUD engine bound to one table.

use crate::sql;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;
use vendstack_core::schema::CREATED_AT_COLUMN;
use vendstack_core::{Clock, CoreError, FieldValues, Record, Result, TableSchema, Value};

/// Schema-aware CRUD against a single table.
///
/// Construction binds the store to one [`TableSchema`]; the schema only
/// changes through the explicit migration operations below, which mutate the
/// physical table and the in-memory column list together.
///
/// # Connections
///
/// Every operation opens a fresh connection via [`RecordStore::connect`] and
/// releases it before returning; on failure the connection is released when
/// it drops. There is no pooling and no shared connection state.
///
/// # Examples
///
/// ```ignore
/// let store = RecordStore::new(options, schema, Arc::new(SystemClock));
/// store.create_table("CREATE TABLE products (id TEXT PRIMARY KEY, name TEXT)").await?;
/// let id = store.insert(&fields).await?;
/// let record = store.get_by_id(&id).await?;
/// ```
pub struct RecordStore {
    schema: RwLock<TableSchema>,
    options: SqliteConnectOptions,
    clock: Arc<dyn Clock>,
}

impl RecordStore {
    /// Create a store for one table.
    #[must_use]
    pub fn new(options: SqliteConnectOptions, schema: TableSchema, clock: Arc<dyn Clock>) -> Self {
        Self {
            schema: RwLock::new(schema),
            options,
            clock,
        }
    }

    /// Snapshot of the current schema.
    #[must_use]
    pub fn schema(&self) -> TableSchema {
        self.schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The table this store is bound to.
    #[must_use]
    pub fn table(&self) -> String {
        self.schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .name()
            .to_string()
    }

    fn replace_schema(&self, schema: TableSchema) {
        *self.schema.write().unwrap_or_else(PoisonError::into_inner) = schema;
    }

    /// Open a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Connection`] when the database file cannot be
    /// opened.
    pub async fn connect(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| CoreError::Connection(e.to_string()))
    }

    /// Execute a `CREATE TABLE` statement.
    ///
    /// The target table name is parsed out of the DDL and checked against the
    /// schema catalog first.
    ///
    /// # Errors
    ///
    /// [`CoreError::AlreadyExists`] when a table of that name exists;
    /// [`CoreError::Validation`] when the DDL carries no table name.
    pub async fn create_table(&self, ddl: &str) -> Result<()> {
        let table = sql::table_name_from_ddl(ddl)?;
        let mut conn = self.connect().await?;
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(&table)
        .fetch_optional(&mut conn)
        .await
        .map_err(CoreError::database)?;
        if existing.is_some() {
            return Err(CoreError::AlreadyExists(table));
        }
        sqlx::query(ddl)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        debug!(table, "created table");
        Ok(())
    }

    /// Add a column to the physical table and the in-memory schema.
    ///
    /// `sql_type` comes from trusted configuration (e.g. `"TEXT"`,
    /// `"INTEGER"`). When `not_null` is set the column gets a type-appropriate
    /// default, since SQLite requires one for non-null columns added to a
    /// populated table.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the column already exists.
    pub async fn add_column(&self, name: &str, sql_type: &str, not_null: bool) -> Result<()> {
        let mut schema = self.schema();
        schema.add_column(name)?;

        let mut statement = format!(
            "ALTER TABLE {} ADD COLUMN {} {sql_type}",
            sql::quote_ident(schema.name()),
            sql::quote_ident(name),
        );
        if not_null {
            let default = if sql_type.to_uppercase().contains("INT")
                || sql_type.to_uppercase().contains("REAL")
            {
                "0"
            } else {
                "''"
            };
            statement.push_str(&format!(" NOT NULL DEFAULT {default}"));
        }

        let mut conn = self.connect().await?;
        sqlx::query(&statement)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        self.replace_schema(schema);
        debug!(column = name, "added column");
        Ok(())
    }

    /// Rename a column on the physical table and the in-memory schema.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when `old` is the identifier column
    /// ("cannot modify identifier column") or does not exist.
    pub async fn rename_column(&self, old: &str, new: &str) -> Result<()> {
        let mut schema = self.schema();
        schema.rename_column(old, new)?;

        let statement = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            sql::quote_ident(schema.name()),
            sql::quote_ident(old),
            sql::quote_ident(new),
        );
        let mut conn = self.connect().await?;
        sqlx::query(&statement)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        self.replace_schema(schema);
        debug!(old, new, "renamed column");
        Ok(())
    }

    /// Drop a column from the physical table and the in-memory schema.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] when the column is the identifier column or
    /// does not exist.
    pub async fn drop_column(&self, name: &str) -> Result<()> {
        let mut schema = self.schema();
        schema.drop_column(name)?;

        let statement = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            sql::quote_ident(schema.name()),
            sql::quote_ident(name),
        );
        let mut conn = self.connect().await?;
        sqlx::query(&statement)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        self.replace_schema(schema);
        debug!(column = name, "dropped column");
        Ok(())
    }

    /// Insert a new record and return its generated identifier.
    ///
    /// The identifier is a random UUID assigned here — never supplied by the
    /// caller. When the schema carries a `created_at` column and the caller
    /// did not provide one, the current time is filled in.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for unknown columns or a caller-supplied
    /// identifier.
    pub async fn insert(&self, fields: &FieldValues) -> Result<String> {
        let schema = self.schema();
        if fields.contains_key(schema.id_column()) {
            return Err(CoreError::validation(format!(
                "identifier column '{}' is assigned by the store, not the caller",
                schema.id_column()
            )));
        }
        self.reject_unknown_columns(&schema, fields)?;

        let id = Uuid::new_v4().to_string();
        let mut row = fields.clone();
        row.insert(schema.id_column().to_string(), Value::Text(id.clone()));
        if schema.has_column(CREATED_AT_COLUMN) && !row.contains_key(CREATED_AT_COLUMN) {
            row.insert(
                CREATED_AT_COLUMN.to_string(),
                Value::Text(self.clock.now().to_rfc3339()),
            );
        }

        let column_list: Vec<String> = row.keys().map(|c| sql::quote_ident(c)).collect();
        let placeholders: Vec<&str> = row.keys().map(|_| "?").collect();
        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            sql::quote_ident(schema.name()),
            column_list.join(", "),
            placeholders.join(", "),
        );

        let mut conn = self.connect().await?;
        let mut query = sqlx::query(&statement);
        for value in row.values() {
            query = sql::bind_value(query, value);
        }
        query
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        debug!(table = schema.name(), id, "inserted record");
        Ok(id)
    }

    /// Update a record **without** the immutability check.
    ///
    /// External callers go through
    /// [`ImmutabilityGuard`](crate::ImmutabilityGuard); this is the raw write
    /// it delegates to. A nonexistent identifier is an error, not a silent
    /// no-op.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] when no row matched; [`CoreError::Validation`]
    /// for an empty field map or unknown columns.
    pub(crate) async fn update_unchecked(&self, id: &str, fields: &FieldValues) -> Result<()> {
        if fields.is_empty() {
            return Err(CoreError::validation("update requires at least one field"));
        }
        let schema = self.schema();
        self.reject_unknown_columns(&schema, fields)?;

        let assignments: Vec<String> = fields
            .keys()
            .map(|c| format!("{} = ?", sql::quote_ident(c)))
            .collect();
        let statement = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            sql::quote_ident(schema.name()),
            assignments.join(", "),
            sql::quote_ident(schema.id_column()),
        );

        let mut conn = self.connect().await?;
        let mut query = sqlx::query(&statement);
        for value in fields.values() {
            query = sql::bind_value(query, value);
        }
        let outcome = query
            .bind(id)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        if outcome.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        debug!(table = schema.name(), id, "updated record");
        Ok(())
    }

    /// Fetch a record by identifier.
    ///
    /// A missing identifier is `Ok(None)`, never an error.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures surface here.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Record>> {
        let schema = self.schema();
        let statement = format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            sql::quote_ident(schema.name()),
            sql::quote_ident(schema.id_column()),
        );
        let mut conn = self.connect().await?;
        let row = sqlx::query(&statement)
            .bind(id)
            .fetch_optional(&mut conn)
            .await
            .map_err(CoreError::database)?;
        row.map(|r| Self::record_from_fields(&schema, sql::row_to_fields(&r)?))
            .transpose()
    }

    /// Search by AND-conjunction equality across all given fields.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an empty filter — a search must supply
    /// at least one predicate rather than scan the whole table — or unknown
    /// columns.
    pub async fn search(&self, filter: &FieldValues) -> Result<Vec<Record>> {
        if filter.is_empty() {
            return Err(CoreError::validation(
                "search requires at least one predicate",
            ));
        }
        let schema = self.schema();
        self.reject_unknown_columns(&schema, filter)?;

        let mut clauses = Vec::with_capacity(filter.len());
        let mut bound: Vec<&Value> = Vec::with_capacity(filter.len());
        for (column, value) in filter {
            if value.is_null() {
                clauses.push(format!("{} IS NULL", sql::quote_ident(column)));
            } else {
                clauses.push(format!("{} = ?", sql::quote_ident(column)));
                bound.push(value);
            }
        }
        let statement = format!(
            "SELECT * FROM {} WHERE {}",
            sql::quote_ident(schema.name()),
            clauses.join(" AND "),
        );

        let mut conn = self.connect().await?;
        let mut query = sqlx::query(&statement);
        for value in bound {
            query = sql::bind_value(query, value);
        }
        let rows = query
            .fetch_all(&mut conn)
            .await
            .map_err(CoreError::database)?;
        rows.iter()
            .map(|r| Self::record_from_fields(&schema, sql::row_to_fields(r)?))
            .collect()
    }

    /// Delete every row where `column == value`; returns the number of rows
    /// removed. Zero matches is reported with a warning, not a failure.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] for an unknown column.
    pub async fn delete_where(&self, column: &str, value: &Value) -> Result<u64> {
        let schema = self.schema();
        if !schema.has_column(column) {
            return Err(CoreError::validation(format!(
                "unknown column '{column}' in table '{}'",
                schema.name()
            )));
        }
        let statement = format!(
            "DELETE FROM {} WHERE {} = ?",
            sql::quote_ident(schema.name()),
            sql::quote_ident(column),
        );
        let mut conn = self.connect().await?;
        let outcome = sql::bind_value(sqlx::query(&statement), value)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        let deleted = outcome.rows_affected();
        if deleted == 0 {
            warn!(table = schema.name(), column, "delete matched no rows");
        }
        Ok(deleted)
    }

    /// Drop the table if it exists. Idempotent.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures surface here.
    pub async fn drop_table(&self) -> Result<()> {
        let schema = self.schema();
        let statement = format!("DROP TABLE IF EXISTS {}", sql::quote_ident(schema.name()));
        let mut conn = self.connect().await?;
        sqlx::query(&statement)
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        debug!(table = schema.name(), "dropped table");
        Ok(())
    }

    /// Escape hatch: run an ad hoc statement that returns rows.
    ///
    /// Caller-supplied values must be passed through `params` — they are
    /// bound, never interpolated.
    ///
    /// # Errors
    ///
    /// Infrastructure failures and SQL errors.
    pub async fn fetch_raw(&self, statement: &str, params: &[Value]) -> Result<Vec<FieldValues>> {
        let mut conn = self.connect().await?;
        let mut query = sqlx::query(statement);
        for value in params {
            query = sql::bind_value(query, value);
        }
        let rows = query
            .fetch_all(&mut conn)
            .await
            .map_err(CoreError::database)?;
        rows.iter().map(sql::row_to_fields).collect()
    }

    /// Escape hatch: run an ad hoc statement that returns no rows; yields the
    /// affected row count.
    ///
    /// # Errors
    ///
    /// Infrastructure failures and SQL errors.
    pub async fn execute_raw(&self, statement: &str, params: &[Value]) -> Result<u64> {
        let mut conn = self.connect().await?;
        let mut query = sqlx::query(statement);
        for value in params {
            query = sql::bind_value(query, value);
        }
        let outcome = query
            .execute(&mut conn)
            .await
            .map_err(CoreError::database)?;
        Ok(outcome.rows_affected())
    }

    fn reject_unknown_columns(&self, schema: &TableSchema, fields: &FieldValues) -> Result<()> {
        for column in fields.keys() {
            if !schema.has_column(column) {
                return Err(CoreError::validation(format!(
                    "unknown column '{column}' in table '{}'",
                    schema.name()
                )));
            }
        }
        Ok(())
    }

    fn record_from_fields(schema: &TableSchema, fields: FieldValues) -> Result<Record> {
        let id = match fields.get(schema.id_column()) {
            Some(Value::Text(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(CoreError::database(format!(
                    "row from '{}' is missing its identifier column '{}'",
                    schema.name(),
                    schema.id_column()
                )))
            }
        };
        Ok(Record::new(id, fields))
    }
}

//! SQL text helpers: identifier quoting, DDL parsing and row decoding.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use vendstack_core::{CoreError, FieldValues, Result, Value};

/// Quote a trusted configuration identifier for interpolation into SQL text.
///
/// Double quotes per the SQL standard, with embedded quotes doubled. This is
/// only ever applied to table/column names from configuration — data values
/// always go through bound parameters.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Extract the target table name from a `CREATE TABLE` statement.
///
/// Handles optional `IF NOT EXISTS` and quoted or parenthesis-adjacent
/// names.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] when no table name can be determined.
pub fn table_name_from_ddl(ddl: &str) -> Result<String> {
    let mut tokens = ddl.split_whitespace();
    while let Some(token) = tokens.next() {
        if !token.eq_ignore_ascii_case("table") {
            continue;
        }
        let mut candidate = tokens.next();
        if candidate.is_some_and(|t| t.eq_ignore_ascii_case("if")) {
            // Skip "NOT EXISTS".
            tokens.next();
            candidate = tokens.next();
        }
        if let Some(raw) = candidate {
            let name = raw
                .split('(')
                .next()
                .unwrap_or_default()
                .trim_matches(|c| c == '"' || c == '`' || c == '[' || c == ']' || c == '\'');
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
        break;
    }
    Err(CoreError::validation(format!(
        "could not determine table name from DDL: {ddl}"
    )))
}

/// Bind a [`Value`] as the next query parameter.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(i) => query.bind(*i),
        Value::Real(r) => query.bind(*r),
        Value::Text(s) => query.bind(s.as_str()),
    }
}

/// Decode every column of a row into a field map.
pub(crate) fn row_to_fields(row: &SqliteRow) -> Result<FieldValues> {
    let mut fields = FieldValues::new();
    for (index, column) in row.columns().iter().enumerate() {
        fields.insert(column.name().to_string(), decode_value(row, index)?);
    }
    Ok(fields)
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(CoreError::database)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_uppercase();
    drop(raw);
    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get(index).map_err(CoreError::database)?),
        "REAL" => Value::Real(row.try_get(index).map_err(CoreError::database)?),
        _ => Value::Text(row.try_get(index).map_err(CoreError::database)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("products"), "\"products\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn table_name_parsed_from_plain_ddl() {
        let ddl = "CREATE TABLE products (id TEXT PRIMARY KEY, name TEXT)";
        assert_eq!(table_name_from_ddl(ddl).ok().as_deref(), Some("products"));
    }

    #[test]
    fn table_name_parsed_with_if_not_exists_and_quotes() {
        let ddl = "create table if not exists \"vending_machines\"(id TEXT)";
        assert_eq!(
            table_name_from_ddl(ddl).ok().as_deref(),
            Some("vending_machines")
        );
    }

    #[test]
    fn missing_table_name_is_a_validation_error() {
        let err = table_name_from_ddl("CREATE INDEX idx ON products(name)")
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("could not determine table name"));
    }
}

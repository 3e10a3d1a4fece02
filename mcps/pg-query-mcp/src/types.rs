//! Type definitions for the PostgreSQL query MCP

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

/// Schema every catalog lookup is restricted to
pub const PUBLIC_SCHEMA: &str = "public";

// ============================================================================
// Row Values
// ============================================================================

/// A single column value, typed from the PostgreSQL column type
///
/// Serialized untagged, so JSON clients see plain `null`, booleans, numbers,
/// strings, or nested JSON documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

/// One result row: column name to value, in result column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a column value. A repeated column name replaces the earlier value.
    pub fn insert(&mut self, column: impl Into<String>, value: SqlValue) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Result of a single SQL execution
///
/// Either `results` holds rows and `error` is absent, or `error` is set and
/// `results` is empty.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub sql_query: String,
    pub results: Vec<Row>,
    pub row_count: u64,
    /// Wall-clock seconds
    pub execution_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set when rows past the configured cap were dropped
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl QueryResult {
    pub fn success(
        sql_query: impl Into<String>,
        results: Vec<Row>,
        row_count: u64,
        execution_time: f64,
    ) -> Self {
        Self {
            sql_query: sql_query.into(),
            results,
            row_count,
            execution_time,
            error: None,
            description: None,
            truncated: false,
        }
    }

    pub fn failure(sql_query: impl Into<String>, error: &DbError, execution_time: f64) -> Self {
        Self {
            sql_query: sql_query.into(),
            results: Vec::new(),
            row_count: 0,
            execution_time,
            error: Some(error.to_string()),
            description: None,
            truncated: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Column description from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub max_length: Option<i32>,
    pub ordinal_position: i32,
}

/// Table description from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub table_type: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaStatus {
    Success,
    Error,
}

/// Live view of the public schema, rebuilt on every request
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableInfo>,
    pub table_count: usize,
    pub schema_text: String,
    pub status: SchemaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Execution error: {0}")]
    Execution(String),
}

impl DbError {
    /// Build an execution error carrying the server's diagnostic fields
    pub fn from_driver(err: &tokio_postgres::Error) -> Self {
        DbError::Execution(driver_message(err))
    }

    /// Build a connection error carrying the server's diagnostic fields
    pub fn connection(err: &tokio_postgres::Error) -> Self {
        DbError::Connection(driver_message(err))
    }
}

fn driver_message(err: &tokio_postgres::Error) -> String {
    let Some(db) = err.as_db_error() else {
        return err.to_string();
    };

    let mut message = format!("{}: {}", db.severity(), db.message());
    if let Some(detail) = db.detail() {
        message.push_str(&format!("\nDETAIL: {}", detail));
    }
    if let Some(hint) = db.hint() {
        message.push_str(&format!("\nHINT: {}", hint));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_serializes_in_column_order() {
        let mut row = Row::default();
        row.insert("zeta", SqlValue::Int(1));
        row.insert("alpha", SqlValue::Text("a".to_string()));
        row.insert("nothing", SqlValue::Null);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"a","nothing":null}"#);
    }

    #[test]
    fn test_row_repeated_column_keeps_last() {
        let mut row = Row::default();
        row.insert("a", SqlValue::Int(1));
        row.insert("a", SqlValue::Int(2));

        assert_eq!(row.len(), 1);
        assert_eq!(row.get("a"), Some(&SqlValue::Int(2)));
    }

    #[test]
    fn test_failure_result_has_no_rows() {
        let err = DbError::Validation("SQL query cannot be empty".to_string());
        let result = QueryResult::failure("  ", &err, 0.0);

        assert!(result.is_error());
        assert!(result.results.is_empty());
        assert_eq!(result.row_count, 0);
        assert!(result.error.unwrap().contains("cannot be empty"));
    }

    #[test]
    fn test_result_envelope_omits_empty_optionals() {
        let result = QueryResult::success("SELECT 1", vec![], 0, 0.5);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("error").is_none());
        assert!(json.get("description").is_none());
        assert!(json.get("truncated").is_none());
        assert_eq!(json["execution_time"], 0.5);
    }

    #[test]
    fn test_schema_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SchemaStatus::Success).unwrap(),
            r#""success""#
        );
        assert_eq!(
            serde_json::to_string(&SchemaStatus::Error).unwrap(),
            r#""error""#
        );
    }
}

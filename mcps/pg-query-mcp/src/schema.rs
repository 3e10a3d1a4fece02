//! Schema introspector - reads the `public` schema from the catalog
//!
//! Nothing is cached; every call reflects the catalog at call time.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::connection::ConnectionManager;
use crate::types::{
    ColumnInfo, DbError, SchemaSnapshot, SchemaStatus, TableInfo, PUBLIC_SCHEMA,
};

// information_schema columns are domain types; cast to plain types for decoding.
const CATALOG_QUERY: &str = "
    SELECT
        t.table_name::text AS table_name,
        t.table_type::text AS table_type,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        c.is_nullable::text AS is_nullable,
        c.column_default::text AS column_default,
        c.character_maximum_length::int4 AS max_length,
        c.ordinal_position::int4 AS ordinal_position
    FROM information_schema.tables t
    JOIN information_schema.columns c
        ON c.table_schema = t.table_schema
       AND c.table_name = t.table_name
    WHERE t.table_schema = $1::text
    ORDER BY t.table_name, c.ordinal_position
";

/// One row of the catalog query
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub table_name: String,
    pub table_type: String,
    pub column: ColumnInfo,
}

/// Fetch a fresh snapshot of the public schema
pub async fn fetch_schema(connections: &ConnectionManager) -> SchemaSnapshot {
    match load_catalog(connections).await {
        Ok(rows) => {
            let tables = build_tables(rows);
            tracing::info!(tables = tables.len(), "Retrieved database schema");
            SchemaSnapshot {
                schema_text: render_schema(&tables),
                table_count: tables.len(),
                tables,
                status: SchemaStatus::Success,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!("Failed to get schema info: {}", e);
            SchemaSnapshot {
                tables: Vec::new(),
                table_count: 0,
                schema_text: format!("Error retrieving schema: {}", e),
                status: SchemaStatus::Error,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn load_catalog(connections: &ConnectionManager) -> Result<Vec<CatalogRow>, DbError> {
    let client = connections.acquire().await?;
    let rows = client
        .query(CATALOG_QUERY, &[&PUBLIC_SCHEMA])
        .await
        .map_err(|e| DbError::from_driver(&e))?;

    rows.iter()
        .map(|row| -> Result<CatalogRow, tokio_postgres::Error> {
            let is_nullable: String = row.try_get("is_nullable")?;
            Ok(CatalogRow {
                table_name: row.try_get("table_name")?,
                table_type: row.try_get("table_type")?,
                column: ColumnInfo {
                    name: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    nullable: is_nullable == "YES",
                    default: row.try_get("column_default")?,
                    max_length: row.try_get("max_length")?,
                    ordinal_position: row.try_get("ordinal_position")?,
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::from_driver(&e))
}

/// Group catalog rows into tables sorted by name, columns in ordinal order
pub fn build_tables(rows: Vec<CatalogRow>) -> Vec<TableInfo> {
    let mut tables: BTreeMap<String, TableInfo> = BTreeMap::new();

    for row in rows {
        tables
            .entry(row.table_name.clone())
            .or_insert_with(|| TableInfo {
                schema: PUBLIC_SCHEMA.to_string(),
                name: row.table_name,
                table_type: row.table_type,
                columns: Vec::new(),
            })
            .columns
            .push(row.column);
    }

    tables
        .into_values()
        .map(|mut table| {
            table.columns.sort_by_key(|c| c.ordinal_position);
            table
        })
        .collect()
}

/// Render tables as prompt-ready text
pub fn render_schema(tables: &[TableInfo]) -> String {
    let mut text = String::from("Database Schema:\n");

    if tables.is_empty() {
        let _ = write!(text, "\n(no tables found in schema '{}')\n", PUBLIC_SCHEMA);
        return text;
    }

    for table in tables {
        let _ = writeln!(text, "\nTable: {}", table.name);
        for column in &table.columns {
            let _ = writeln!(
                text,
                "  - {} ({}, nullable: {})",
                column.name,
                column.data_type,
                if column.nullable { "YES" } else { "NO" }
            );
        }
    }

    text
}

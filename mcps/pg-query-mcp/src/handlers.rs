//! Tool handlers
//!
//! Every handler returns a successful tool result; per-call failures are
//! reported inside the JSON envelope, never as protocol errors.

use std::time::Instant;

use mcp_common::{json_success, CallToolResult, McpError};

use crate::connection::ConnectionManager;
use crate::executor::QueryExecutor;
use crate::params::*;
use crate::schema;
use crate::types::{QueryResult, Row, SchemaSnapshot, SqlValue};

const NEXT_STEP: &str = "Call execute_sql_query with the generated SQL";
const GUIDANCE: &str = "Please use the LLM client to generate SQL from the provided context \
and schema information, then call execute_sql_query with the generated SQL.";

pub async fn execute_sql_query(
    connections: &ConnectionManager,
    executor: &QueryExecutor,
    params: ExecuteSqlParams,
) -> Result<CallToolResult, McpError> {
    match params.description.as_deref() {
        Some(description) => tracing::info!(
            description,
            "Executing SQL query: {}",
            params.sql_query
        ),
        None => tracing::info!("Executing SQL query: {}", params.sql_query),
    }

    let mut result = executor.execute(connections, &params.sql_query).await;
    result.description = params.description;

    json_success(&result)
}

pub async fn get_database_schema(
    connections: &ConnectionManager,
) -> Result<CallToolResult, McpError> {
    tracing::info!("Retrieving database schema information");
    let snapshot = schema::fetch_schema(connections).await;
    json_success(&snapshot)
}

pub async fn natural_language_query(
    connections: &ConnectionManager,
    params: NaturalLanguageQueryParams,
) -> Result<CallToolResult, McpError> {
    tracing::info!("Processing natural language query: {}", params.query);

    let started = Instant::now();
    let snapshot = schema::fetch_schema(connections).await;
    let result = sql_generation_request(&snapshot, &params, started.elapsed().as_secs_f64());

    json_success(&result)
}

/// Package the schema and the user's request for the client to turn into SQL
///
/// Nothing is executed here; the single result row carries the schema context.
pub fn sql_generation_request(
    snapshot: &SchemaSnapshot,
    params: &NaturalLanguageQueryParams,
    elapsed: f64,
) -> QueryResult {
    let prompt = build_prompt(
        &snapshot.schema_text,
        &params.query,
        params.context.as_deref(),
    );

    if let Some(error) = &snapshot.error {
        let mut result = QueryResult::success(prompt, Vec::new(), 0, elapsed);
        result.error = Some(error.clone());
        return result;
    }

    let mut row = Row::with_capacity(5);
    row.insert("message", SqlValue::Text(GUIDANCE.to_string()));
    row.insert("schema_info", SqlValue::Text(snapshot.schema_text.clone()));
    row.insert("user_query", SqlValue::Text(params.query.clone()));
    row.insert(
        "context",
        params
            .context
            .clone()
            .map(SqlValue::Text)
            .unwrap_or(SqlValue::Null),
    );
    row.insert("next_step", SqlValue::Text(NEXT_STEP.to_string()));

    QueryResult::success(prompt, vec![row], 1, elapsed)
}

fn build_prompt(schema_text: &str, query: &str, context: Option<&str>) -> String {
    let context = context
        .map(|c| format!("Additional Context: {}\n\n", c))
        .unwrap_or_default();

    format!(
        "Database Schema Information:\n\
         {schema_text}\n\
         User Query: {query}\n\n\
         {context}\
         Please generate a PostgreSQL SQL query based on the user's natural language request \
         and the database schema above.\n\
         The query should be safe, efficient, and return the requested data.\n\n\
         Requirements:\n\
         1. Use only the tables and columns available in the schema\n\
         2. Use PostgreSQL syntax\n\
         3. Include appropriate WHERE clauses for security\n\
         4. Add LIMIT clauses for large result sets if appropriate\n\
         5. Use proper JOINs when querying multiple tables\n\
         6. Return only the SQL query, no explanations\n\n\
         Generated SQL Query:\n"
    )
}

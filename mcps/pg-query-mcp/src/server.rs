//! MCP Server implementation for PostgreSQL queries
//!
//! Tools delegate to the handlers module; the server owns the shared
//! connection manager and the query executor.

use std::sync::Arc;

use mcp_common::{
    async_trait, CallToolResult, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router,
};
use serde_json::Value;

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::executor::QueryExecutor;
use crate::guard::{default_deny_patterns, SqlGuard};
use crate::handlers;
use crate::params::*;
use crate::types::DbError;

/// The PostgreSQL query MCP Server
#[derive(Clone)]
pub struct PgQueryMcpServer {
    connections: Arc<ConnectionManager>,
    executor: QueryExecutor,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl PgQueryMcpServer {
    /// Create a server from `DB_*` environment variables
    ///
    /// Fails when required variables are missing or malformed. No connection
    /// is opened until the first tool call.
    pub fn from_env() -> Result<Self, DbError> {
        Self::with_config(Config::from_env()?)
    }

    /// Create a server with explicit config
    pub fn with_config(config: Config) -> Result<Self, DbError> {
        let guard = SqlGuard::new(&default_deny_patterns())?;
        tracing::info!(
            db = %config.connection.display_target(),
            max_results = ?config.settings.max_results,
            "Configured PostgreSQL query server"
        );

        Ok(Self {
            executor: QueryExecutor::new(guard, &config.settings),
            connections: Arc::new(ConnectionManager::new(config.connection)),
            tool_router: Self::tool_router(),
        })
    }

    /// Shared connection manager
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    #[tool(description = "Execute a SQL query against the PostgreSQL database and return \
        the results. The LLM client handles conversion from natural language to SQL. Returns \
        sql_query, results (rows as column/value objects), row_count, execution_time in seconds, \
        and error when the query fails. Example: SELECT customer_id, COUNT(*) AS order_count \
        FROM orders GROUP BY customer_id")]
    async fn execute_sql_query(
        &self,
        Parameters(params): Parameters<ExecuteSqlParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::execute_sql_query(&self.connections, &self.executor, params).await
    }

    #[tool(description = "Get the database schema (tables, columns, data types, nullability, \
        defaults) of the public schema to help with SQL query generation. Returns tables, \
        table_count, schema_text, and status.")]
    async fn get_database_schema(&self) -> Result<CallToolResult, McpError> {
        handlers::get_database_schema(&self.connections).await
    }

    #[tool(description = "Prepare a natural language question for SQL generation. Returns the \
        current database schema together with the question and instructions; the client \
        generates the SQL and then calls execute_sql_query. Nothing is executed by this tool. \
        Example: 'What are the top 10 products by sales?'")]
    async fn natural_language_query(
        &self,
        Parameters(params): Parameters<NaturalLanguageQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::natural_language_query(&self.connections, params).await
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for PgQueryMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "PostgreSQL query MCP server connected to database '{}'. \
                 Use get_database_schema to inspect tables, natural_language_query to get \
                 schema context for a question, and execute_sql_query to run the SQL you write. \
                 Errors are reported in the 'error' field of each result.",
                self.connections.config().database
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for PgQueryMcpServer {
    fn server_name(&self) -> &str {
        "postgres-nl-query"
    }

    fn server_description(&self) -> Option<&str> {
        Some(
            "PostgreSQL query MCP Server - schema introspection and SQL execution \
             for LLM-generated queries.",
        )
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "execute_sql_query" => {
                let params: ExecuteSqlParams = serde_json::from_value(params)?;
                self.execute_sql_query(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "get_database_schema" => self.get_database_schema().await.map_err(Into::into),

            "natural_language_query" => {
                let params: NaturalLanguageQueryParams = serde_json::from_value(params)?;
                self.natural_language_query(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;
    use crate::connection::tests::unreachable_config;
    use rmcp::model::RawContent;

    fn test_server() -> PgQueryMcpServer {
        PgQueryMcpServer::with_config(Config {
            connection: unreachable_config(),
            settings: ServerSettings::default(),
        })
        .unwrap()
    }

    fn envelope(result: &CallToolResult) -> Value {
        let text = match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            other => panic!("unexpected content: {:?}", other),
        };
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_embeddable_server_name() {
        let server = test_server();
        assert_eq!(server.server_name(), "postgres-nl-query");
    }

    #[test]
    fn test_embeddable_list_tools() {
        let server = test_server();
        let tools = server.list_tools();

        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["execute_sql_query", "get_database_schema", "natural_language_query"]
        );
    }

    #[tokio::test]
    async fn test_empty_sql_reported_in_envelope() {
        let server = test_server();
        let result = server
            .call_tool("execute_sql_query", serde_json::json!({ "sql_query": " " }))
            .await
            .unwrap();

        assert!(!result.is_error.unwrap_or(false));
        let body = envelope(&result);
        assert!(body["error"].as_str().unwrap().contains("cannot be empty"));
        assert_eq!(body["row_count"], 0);
        assert_eq!(body["results"], serde_json::json!([]));
        assert_eq!(server.connections().acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_description_echoed() {
        let server = test_server();
        let result = server
            .call_tool(
                "execute_sql_query",
                serde_json::json!({ "sql_query": "", "description": "nothing" }),
            )
            .await
            .unwrap();

        assert_eq!(envelope(&result)["description"], "nothing");
    }

    #[tokio::test]
    async fn test_schema_error_reported_in_envelope() {
        let server = test_server();
        let result = server
            .call_tool("get_database_schema", serde_json::json!({}))
            .await
            .unwrap();

        let body = envelope(&result);
        assert_eq!(body["status"], "error");
        assert_eq!(body["table_count"], 0);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_natural_language_query_without_database() {
        let server = test_server();
        let result = server
            .call_tool(
                "natural_language_query",
                serde_json::json!({ "query": "show all users" }),
            )
            .await
            .unwrap();

        let body = envelope(&result);
        assert!(body["error"].is_string());
        assert_eq!(body["results"], serde_json::json!([]));
        assert!(body["sql_query"]
            .as_str()
            .unwrap()
            .contains("User Query: show all users"));
    }

    #[tokio::test]
    async fn test_missing_parameter_is_serde_error() {
        let server = test_server();
        let result = server
            .call_tool("execute_sql_query", serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(EmbeddableError::SerdeError(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = test_server();
        let result = server
            .call_tool("drop_database", serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(_))));
    }
}

//! PostgreSQL Query MCP Library
//!
//! Schema introspection and SQL execution for LLM clients. The client turns
//! natural language into SQL; this crate supplies schema context, runs the
//! resulting statement, and reports rows, timing, and errors in one envelope.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use pg_query_mcp::{EmbeddableMcp, PgQueryMcpServer};
//!
//! let server = PgQueryMcpServer::from_env()?;
//! let result = server
//!     .call_tool("execute_sql_query", serde_json::json!({ "sql_query": "SELECT 1" }))
//!     .await?;
//! ```
//!
//! # Usage as Binary
//!
//! Run with `DB_NAME`, `DB_USER` and `DB_PASSWORD` set: `pg-query-mcp`
//!
//! Or configure in `.mcp.json`:
//! ```json
//! { "mcpServers": { "postgres": { "command": "./pg-query-mcp", "env": { "DB_NAME": "shop" } } } }
//! ```

pub mod config;
pub mod connection;
pub mod executor;
pub mod guard;
pub mod handlers;
pub mod params;
pub mod schema;
pub mod server;
pub mod types;
pub mod value;

// Re-export main server type
pub use server::PgQueryMcpServer;

// Re-export parameter types for direct API usage
pub use params::*;

pub use config::{Config, ConnectionConfig, ServerSettings};
pub use connection::ConnectionManager;
pub use executor::QueryExecutor;
pub use types::{
    ColumnInfo, DbError, QueryResult, Row, SchemaSnapshot, SchemaStatus, SqlValue, TableInfo,
};

// Re-export EmbeddableMcp trait for in-process usage
pub use mcp_common::{EmbeddableError, EmbeddableMcp, EmbeddableResult};

//! PostgreSQL Query MCP Server
//!
//! Exposes schema introspection and SQL execution over MCP stdio.
//! Exits with status 1 when the `DB_*` configuration is missing or invalid.

use pg_query_mcp::PgQueryMcpServer;

mcp_common::serve_stdio!(PgQueryMcpServer, "pg_query_mcp");

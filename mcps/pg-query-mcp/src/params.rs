//! Parameter types for PostgreSQL query MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteSqlParams {
    #[schemars(description = "SQL query to execute against the PostgreSQL database")]
    pub sql_query: String,

    #[schemars(description = "Optional description of what the query does")]
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NaturalLanguageQueryParams {
    #[schemars(
        description = "Natural language description of what you want to query from the database"
    )]
    pub query: String,

    #[schemars(
        description = "Optional context or additional information to help with SQL generation"
    )]
    #[serde(default)]
    pub context: Option<String>,
}

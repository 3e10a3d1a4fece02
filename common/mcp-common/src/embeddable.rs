//! In-process tool execution
//!
//! [`EmbeddableMcp`] lets a host call an MCP server's tools directly, without
//! a transport in between. Tests use it to drive tools by name with JSON
//! parameters, exactly as a client would send them.
//!
//! ```rust,ignore
//! let server = PgQueryMcpServer::from_env()?;
//! let result = server
//!     .call_tool("get_database_schema", serde_json::json!({}))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Error type for embedded tool calls
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Parameters did not deserialize into the tool's parameter type
    #[error("invalid parameters: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// The tool returned a protocol-level error
    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// An MCP server whose tools can be invoked in-process
///
/// Implementations are `Send + Sync` so concurrent tasks can share one
/// server, mirroring concurrent client requests.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Name used to identify the server in configuration
    fn server_name(&self) -> &str;

    /// All tools with their input schemas
    fn list_tools(&self) -> Vec<Tool>;

    /// Invoke a tool by name with JSON object parameters
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    struct EchoServer;

    #[async_trait]
    impl EmbeddableMcp for EchoServer {
        fn server_name(&self) -> &str {
            "echo"
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![]
        }

        async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
            match name {
                "echo" => {
                    let text: String = serde_json::from_value(params)?;
                    Ok(CallToolResult::success(vec![Content::text(text)]))
                }
                "fail" => Err(rmcp::ErrorData::internal_error("boom", None).into()),
                _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
            }
        }
    }

    #[test]
    fn test_default_description() {
        assert!(EchoServer.server_description().is_none());
        assert_eq!(EchoServer.server_name(), "echo");
    }

    #[tokio::test]
    async fn test_bad_params_are_serde_error() {
        let result = EchoServer.call_tool("echo", serde_json::json!(42)).await;
        assert!(matches!(result, Err(EmbeddableError::SerdeError(_))));
    }

    #[tokio::test]
    async fn test_protocol_error_converted() {
        let result = EchoServer.call_tool("fail", serde_json::json!({})).await;
        match result {
            Err(EmbeddableError::McpError(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = EchoServer.call_tool("missing", serde_json::json!({})).await;
        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(_))));
    }
}

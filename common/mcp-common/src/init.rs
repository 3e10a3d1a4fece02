//! Server initialization utilities
//!
//! Tracing setup and the `serve_stdio!` macro shared by MCP server binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for an MCP server
///
/// Logs go to stderr because stdout carries the MCP protocol. `RUST_LOG`
/// filters as usual; the server crate itself logs at `LOG_LEVEL` (default
/// `info`). `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let level = std::env::var("LOG_LEVEL")
        .map(|v| v.to_lowercase())
        .unwrap_or_else(|_| "info".to_string());
    let filter =
        EnvFilter::from_default_env().add_directive(directive(crate_name, &level).parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

// Python-style level names are accepted for LOG_LEVEL.
fn directive(crate_name: &str, level: &str) -> String {
    let level = match level {
        "warning" => "warn",
        "critical" => "error",
        other => other,
    };
    format!("{}={}", crate_name, level)
}

/// Generate `main` for an MCP server served over stdio
///
/// The server type must provide `from_env() -> Result<Self, E>` where `E`
/// converts into `anyhow::Error`. A startup failure is logged and returned
/// from `main`, so the process exits with status 1.
///
/// ```rust,ignore
/// mcp_common::serve_stdio!(MyMcpServer, "my_mcp");
/// ```
#[macro_export]
macro_rules! serve_stdio {
    ($server_type:ty, $crate_name:expr) => {
        #[tokio::main]
        async fn main() -> anyhow::Result<()> {
            use rmcp::ServiceExt;

            $crate::init_tracing($crate_name)?;

            tracing::info!(concat!("Starting ", $crate_name, " MCP Server"));

            let server = match <$server_type>::from_env() {
                Ok(server) => server,
                Err(e) => {
                    tracing::error!("Startup failed: {}", e);
                    return Err(e.into());
                }
            };
            let service = server.serve(rmcp::transport::stdio()).await?;

            tracing::info!("Server running, waiting for requests...");

            service.waiting().await?;

            tracing::info!("Server shutting down");
            Ok(())
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_scopes_crate() {
        assert_eq!(directive("pg_query_mcp", "debug"), "pg_query_mcp=debug");
    }

    #[test]
    fn test_directive_maps_python_levels() {
        assert_eq!(directive("pg_query_mcp", "warning"), "pg_query_mcp=warn");
        assert_eq!(directive("pg_query_mcp", "critical"), "pg_query_mcp=error");
    }

    #[test]
    fn test_directive_parses() {
        let parsed: Result<tracing_subscriber::filter::Directive, _> =
            directive("pg_query_mcp", "info").parse();
        assert!(parsed.is_ok());
    }
}

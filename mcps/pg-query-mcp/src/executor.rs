//! Query executor - runs a single statement and normalizes the outcome
//!
//! `execute` never fails: validation, connection, and driver errors all end
//! up in the `error` field of the returned [`QueryResult`].

use std::time::Instant;

use tokio_postgres::{Client, SimpleQueryMessage, Statement};

use crate::config::ServerSettings;
use crate::connection::ConnectionManager;
use crate::guard::SqlGuard;
use crate::types::{DbError, QueryResult, Row};
use crate::value;

/// Rows produced by one statement
struct StatementOutput {
    rows: Vec<Row>,
    row_count: u64,
    truncated: bool,
}

#[derive(Clone)]
pub struct QueryExecutor {
    guard: SqlGuard,
    max_results: Option<usize>,
}

impl QueryExecutor {
    pub fn new(guard: SqlGuard, settings: &ServerSettings) -> Self {
        Self {
            guard,
            max_results: settings.max_results,
        }
    }

    /// Execute one SQL statement against the shared connection
    pub async fn execute(&self, connections: &ConnectionManager, sql: &str) -> QueryResult {
        let started = Instant::now();

        if let Err(e) = self.guard.check(sql) {
            tracing::warn!("Rejected query: {}", e);
            return QueryResult::failure(sql, &e, started.elapsed().as_secs_f64());
        }

        let client = match connections.acquire().await {
            Ok(client) => client,
            Err(e) => return QueryResult::failure(sql, &e, started.elapsed().as_secs_f64()),
        };

        // Each call is its own unit of work, so nothing a statement opens
        // survives into the next call.
        let outcome = self.run(&client, sql).await;
        match &outcome {
            Ok(_) => commit(&client).await,
            Err(_) => rollback(&client).await,
        }
        drop(client);

        let elapsed = started.elapsed().as_secs_f64();
        match outcome {
            Ok(output) => {
                tracing::info!(
                    rows = output.row_count,
                    elapsed_secs = elapsed,
                    "Query executed"
                );
                let mut result =
                    QueryResult::success(sql, output.rows, output.row_count, elapsed);
                result.truncated = output.truncated;
                result
            }
            Err(e) => {
                tracing::error!("Query execution failed: {}", e);
                QueryResult::failure(sql, &e, elapsed)
            }
        }
    }

    async fn run(&self, client: &Client, sql: &str) -> Result<StatementOutput, DbError> {
        // Preparing first yields typed column descriptors and refuses
        // multi-statement input before anything executes.
        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| DbError::from_driver(&e))?;

        let messages = client
            .simple_query(sql)
            .await
            .map_err(|e| DbError::from_driver(&e))?;

        Ok(collect_output(&statement, messages, self.max_results))
    }
}

fn collect_output(
    statement: &Statement,
    messages: Vec<SimpleQueryMessage>,
    max_results: Option<usize>,
) -> StatementOutput {
    let columns = statement.columns();
    let mut rows = Vec::new();
    let mut affected = 0;
    let mut truncated = false;

    for message in messages {
        match message {
            SimpleQueryMessage::Row(raw) => {
                if max_results.is_some_and(|max| rows.len() >= max) {
                    truncated = true;
                    continue;
                }
                let mut row = Row::with_capacity(columns.len());
                for (idx, column) in columns.iter().enumerate() {
                    let text = raw.try_get(idx).ok().flatten();
                    row.insert(column.name(), value::from_text(column.type_(), text));
                }
                rows.push(row);
            }
            SimpleQueryMessage::CommandComplete(count) => affected = count,
            _ => {}
        }
    }

    // Result-producing statements report what was returned; the rest
    // report rows affected.
    let row_count = if columns.is_empty() {
        affected
    } else {
        rows.len() as u64
    };

    StatementOutput {
        rows,
        row_count,
        truncated,
    }
}

/// Close any transaction the statement left open
///
/// Outside a transaction the server answers with a warning, not an error.
async fn commit(client: &Client) {
    if let Err(e) = client.batch_execute("COMMIT").await {
        tracing::debug!("Commit after query did not run: {}", e);
    }
}

async fn rollback(client: &Client) {
    if let Err(e) = client.batch_execute("ROLLBACK").await {
        tracing::debug!("Rollback after failed query did not run: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::tests::unreachable_config;
    use crate::guard::default_deny_patterns;

    fn executor() -> QueryExecutor {
        let guard = SqlGuard::new(&default_deny_patterns()).unwrap();
        QueryExecutor::new(guard, &ServerSettings::default())
    }

    #[tokio::test]
    async fn test_empty_sql_skips_connection() {
        let connections = ConnectionManager::new(unreachable_config());

        let result = executor().execute(&connections, "   ").await;

        assert!(result.error.as_deref().unwrap().contains("cannot be empty"));
        assert!(result.results.is_empty());
        assert_eq!(result.row_count, 0);
        assert!(result.execution_time >= 0.0);
        assert_eq!(connections.acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_blocked_sql_skips_connection() {
        let connections = ConnectionManager::new(unreachable_config());

        let result = executor()
            .execute(&connections, "SELECT 1; DROP TABLE users")
            .await;

        assert!(result.error.as_deref().unwrap().contains("blocked pattern"));
        assert_eq!(connections.acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_reported_in_result() {
        let connections = ConnectionManager::new(unreachable_config());

        let result = executor().execute(&connections, "SELECT 1").await;

        assert_eq!(result.sql_query, "SELECT 1");
        assert!(result.error.as_deref().unwrap().starts_with("Connection error"));
        assert!(result.results.is_empty());
        assert_eq!(result.row_count, 0);
        assert_eq!(connections.acquisitions(), 1);
    }
}

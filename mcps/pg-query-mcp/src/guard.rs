//! SQL guard - pattern checks applied before a statement reaches the database
//!
//! This is a heuristic, not a SQL parser. It catches the common shape of
//! stacked-statement injection (a statement separator followed by a comment
//! marker or a second destructive statement). Real protection comes from the
//! privileges of the database role the server connects as.
//!
//! `COPY ... FROM STDIN` / `COPY ... TO STDOUT` are refused outright: they
//! switch the session into a streaming sub-protocol that a single tool call
//! has no way to feed or drain.

use regex::{Regex, RegexBuilder};

use crate::types::DbError;

/// Default patterns rejected by the guard
pub fn default_deny_patterns() -> Vec<String> {
    vec![
        // separator then comment
        r";\s*--".to_string(),
        r";\s*/\*".to_string(),
        // stacked DDL
        r";\s*(drop|truncate|alter|grant|revoke|create)\b".to_string(),
        // stacked DML
        r";\s*(delete|update|insert)\b".to_string(),
    ]
}

/// `COPY` streaming to or from the client
const COPY_STREAM_PATTERN: &str = r"^\s*copy\b[\s\S]*\b(from\s+stdin|to\s+stdout)\b";

/// Statement validation guard
#[derive(Clone)]
pub struct SqlGuard {
    deny_patterns: Vec<Regex>,
    copy_stream: Regex,
}

fn compile(pattern: &str) -> Result<Regex, DbError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| DbError::Configuration(format!("Invalid deny pattern '{}': {}", pattern, e)))
}

impl SqlGuard {
    /// Create a guard from regex patterns, matched case-insensitively
    pub fn new(patterns: &[String]) -> Result<Self, DbError> {
        let deny_patterns = patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            deny_patterns,
            copy_stream: compile(COPY_STREAM_PATTERN)?,
        })
    }

    /// Validate a statement before execution
    pub fn check(&self, sql: &str) -> Result<(), DbError> {
        if sql.trim().is_empty() {
            return Err(DbError::Validation("SQL query cannot be empty".to_string()));
        }

        if self.copy_stream.is_match(sql) {
            return Err(DbError::Validation(
                "COPY FROM STDIN / TO STDOUT is not supported; use SELECT to read rows \
                 or INSERT to write them"
                    .to_string(),
            ));
        }

        for pattern in &self.deny_patterns {
            if pattern.is_match(sql) {
                return Err(DbError::Validation(format!(
                    "Query matches blocked pattern: {}",
                    pattern.as_str()
                )));
            }
        }

        Ok(())
    }
}

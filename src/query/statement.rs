//! Executable statements
//!
//! A [`Statement`] is SQL text with PostgreSQL positional markers (`$1..$n`)
//! and the ordered values bound to them. Every producer in the crate (the
//! named-query rewriter and the three builders) yields one, and every consumer
//! (executors, pagination, the versioned writer) accepts one.

use sea_query::Value;

const LOG_TARGET: &str = "shelfmap::sql";

/// SQL text plus its positional arguments
///
/// `values[i]` is bound to marker `$(i + 1)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// A statement without arguments
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// SQL text with every whitespace run collapsed to a single space
    pub fn minified(&self) -> String {
        minify_sql(&self.sql)
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces
///
/// ```rust
/// use shelfmap::query::minify_sql;
///
/// let sql = "SELECT id\n      FROM books\n     WHERE id = $1";
/// assert_eq!(minify_sql(sql), "SELECT id FROM books WHERE id = $1");
/// ```
pub fn minify_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Send the minified statement text to the SQL log target
pub(crate) fn log_statement(statement: &Statement) {
    if log::log_enabled!(target: LOG_TARGET, log::Level::Info) {
        log::info!(target: LOG_TARGET, "{}", statement.minified());
    }
}

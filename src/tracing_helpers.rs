//! Span constructors for the `tracing` feature
//!
//! Executors, connections and transactions enter these spans around each
//! driver call; install any `tracing` subscriber to collect them.

use tracing::Span;

/// Longest SQL prefix recorded on a query span
const MAX_STATEMENT_LEN: usize = 256;

pub fn execute_query_span(sql: &str) -> Span {
    tracing::debug_span!(
        "shelfmap.execute_query",
        db.system = "postgresql",
        db.statement = %truncate(sql)
    )
}

pub fn acquire_connection_span() -> Span {
    tracing::debug_span!("shelfmap.connect", db.system = "postgresql")
}

pub fn begin_transaction_span(depth: u32) -> Span {
    tracing::debug_span!("shelfmap.transaction.begin", depth)
}

pub fn commit_transaction_span(depth: u32) -> Span {
    tracing::debug_span!("shelfmap.transaction.commit", depth)
}

pub fn rollback_transaction_span(depth: u32) -> Span {
    tracing::debug_span!("shelfmap.transaction.rollback", depth)
}

fn truncate(sql: &str) -> &str {
    if sql.len() <= MAX_STATEMENT_LEN {
        return sql;
    }
    let mut end = MAX_STATEMENT_LEN;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

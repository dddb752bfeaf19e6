//! Error detection and classification utilities.
//!
//! Driver errors are sorted into the crate's taxonomy here: a cancelled
//! statement (SQLSTATE `57014`, raised when `statement_timeout` fires) becomes
//! `ShelfError::Timeout`, a server error naming a constraint becomes
//! `ShelfError::ConstraintViolation`, and everything else stays an opaque
//! `ShelfError::PostgresError`.

use crate::executor::ShelfError;
use postgres::error::SqlState;
use postgres::Error as PostgresError;

/// Classify a driver error.
pub(crate) fn map_postgres_error(err: PostgresError) -> ShelfError {
    let classified = {
        let db = err.as_db_error();
        classify(
            err.code(),
            db.and_then(|db| db.constraint()),
            db.map(|db| db.message()).unwrap_or_default(),
        )
    };
    classified.unwrap_or(ShelfError::PostgresError(err))
}

/// The taxonomy variant for a server error, `None` when it stays opaque
fn classify(code: Option<&SqlState>, constraint: Option<&str>, message: &str) -> Option<ShelfError> {
    if code == Some(&SqlState::QUERY_CANCELED) {
        return Some(ShelfError::Timeout);
    }
    constraint.map(|constraint| ShelfError::ConstraintViolation {
        constraint: constraint.to_string(),
        message: message.to_string(),
    })
}

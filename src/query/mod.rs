//! Statement construction for shelfmap.
//!
//! Everything here produces a [`Statement`]: SQL text with PostgreSQL
//! positional markers plus the ordered values bound to them.
//!
//! # Architecture
//!
//! - **Named**: `:identifier` templates rewritten to `$n` markers (`named_query`)
//! - **Builder**: metadata-driven `SELECT`/`INSERT`/`UPDATE` builders
//! - **Statement**: the shared output type and SQL minification for logging
//! - **Value Conversion**: SeaQuery `Value` to `ToSql` parameters and rows back
//! - **Error Handling**: driver error classification
//!
//! # Examples
//!
//! ```rust
//! use shelfmap::named_params;
//! use shelfmap::query::named_query;
//!
//! let params = named_params! {
//!     "title" => "Dune",
//!     "userID" => 7i64,
//! };
//! let statement = named_query(
//!     "SELECT id FROM books WHERE (title = :title OR :title = '') AND user_id = :userID",
//!     &params,
//! )?;
//! assert_eq!(
//!     statement.sql,
//!     "SELECT id FROM books WHERE (title = $1 OR $2 = '') AND user_id = $3"
//! );
//! # Ok::<(), shelfmap::ShelfError>(())
//! ```

pub mod builder;
pub(crate) mod error_handling;
pub mod named;
pub mod statement;
pub mod value_conversion;

pub use builder::{
    renumber_markers, BuildStatement, Column, Condition, InsertBuilder, SelectBuilder,
    SortDirection, UpdateBuilder,
};
pub use named::{named_query, NamedParams};
pub use statement::{minify_sql, Statement};
pub(crate) use statement::log_statement;

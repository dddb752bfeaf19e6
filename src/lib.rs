//! # shelfmap
//!
//! Metadata-driven persistence mapping for PostgreSQL.
//!
//! Records declare their columns and transport names with `#[derive(Record)]`.
//! From that single table shelfmap builds column lists and INSERT/UPDATE
//! statements, rewrites `:named` templates to positional SQL, converts between
//! record shapes, scans joined rows back into nested records, pages results
//! and writes with optimistic concurrency.
//!
//! ```rust
//! use shelfmap::query::{BuildStatement, InsertBuilder};
//! use shelfmap::Record;
//!
//! #[derive(Default, Record)]
//! #[record(table = "books")]
//! struct Book {
//!     #[record(db = "id", primary_key)]
//!     id: i64,
//!     #[record(db = "title")]
//!     title: String,
//!     #[record(db = "pages")]
//!     pages: i32,
//! }
//!
//! let book = Book { id: 0, title: "Dune".to_string(), pages: 412 };
//! let statement = InsertBuilder::from_model(&book).build();
//! assert_eq!(statement.sql, "INSERT INTO books (title, pages) VALUES ($1, $2)");
//! assert_eq!(statement.values.len(), 2);
//! ```

// Generated code refers to `::shelfmap`, including inside this crate
extern crate self as shelfmap;

#[macro_use]
mod macros;

pub mod bookshelf;
pub mod config;
pub mod connection;
pub mod executor;
pub mod model;
pub mod pagination;
pub mod query;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;
pub mod transaction;
pub mod validation;
pub mod value;
pub mod writer;

pub use sea_query;

pub use config::ShelfConfig;
pub use connection::{connect, validate_connection_string};
pub use executor::{PostgresExecutor, ShelfError, ShelfExecutor, StatementExt};
pub use model::{
    convert, convert_into, convert_optional, select_columns, ConversionIssue, ConversionReport,
    Converted, FieldKind, FieldMeta, FieldMut, FieldRef, IssueKind, Record, RecordMeta,
};
pub use pagination::{Filters, Metadata};
pub use query::{named_query, BuildStatement, NamedParams, Statement};
pub use shelfmap_derive::Record;
pub use transaction::{run_in_transaction, IsolationLevel, Transaction};
pub use validation::{ValidationErrors, Validator};
pub use value::{RowCursor, TryGetable, ValueExtractionError, ValueRow, ValueType};
pub use writer::{Ownership, Versioned, VersionedWriter};

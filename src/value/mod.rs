//! Value type system for shelfmap
//!
//! This module provides traits for type-safe value conversions between Rust types
//! and `sea_query::Value`, plus the driver-independent row type executors return.
//!
//! ## Traits
//!
//! - **`ValueType`** - Maps Rust types to their corresponding `sea_query::Value` variant
//! - **`TryGetable`** - Safe value extraction with error handling
//!
//! ## Rows
//!
//! - **`ValueRow`** - one result row of `sea_query::Value`s
//! - **`RowCursor`** - positional reader used to scan records

pub mod row;
pub mod try_getable;
pub mod types;

pub use row::{RowCursor, ValueRow};
pub use try_getable::{TryGetable, ValueExtractionError};
pub use types::ValueType;

//! Procedural macros for shelfmap
//!
//! This crate provides the `Record` derive, which turns a plain struct into a
//! record with a compile-time metadata table and positional field accessors.

mod attributes;
mod macros;
mod type_conversion;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Record` - generates field metadata and accessors
///
/// This macro generates:
/// - A `static` `RecordMeta` table (type name, table name, one `FieldMeta` per field
///   in declaration order)
/// - `field()` / `field_mut()` accessors used by the conversion engine
/// - `column_value()` / `scan_field()` used by the query builders and row scanning
/// - `primary_key_value()` / `null_primary_key()` for foreign-key binding
///
/// # Attributes
///
/// Struct level:
/// - `#[record(table = "books")]` - table name (defaults to the lower-cased type name plus `s`)
///
/// Field level, any combination of:
/// - `key = "value"` - an annotation tag, e.g. `db = "title"` or `dto = "title"`
/// - `primary_key` - identity column, excluded from generated INSERT/UPDATE lists
/// - `generated` - store-assigned column (selected, never written)
/// - `nested` - the field holds another record (`R` or `Option<R>`)
///
/// # Example
///
/// ```ignore
/// use shelfmap::Record;
///
/// #[derive(Debug, Clone, Default, Record)]
/// #[record(table = "books")]
/// pub struct Book {
///     #[record(db = "id", primary_key)]
///     pub id: i64,
///     #[record(db = "title", dto = "title")]
///     pub title: String,
///     #[record(nested)]
///     pub user: Option<User>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    macros::derive_record(input)
}

//! Record metadata, field access and conversion
//!
//! - **`meta`** - static per-type field tables (`RecordMeta`, `FieldMeta`)
//! - **`record`** - the `Record` trait and type-erased field views
//! - **`convert`** - annotation-driven conversion between record types

pub mod convert;
pub mod meta;
pub mod record;

pub use convert::{
    convert, convert_into, convert_optional, ConversionIssue, ConversionReport, Converted,
    IssueKind,
};
pub use meta::{FieldKind, FieldMeta, RecordMeta, DB_TAG};
pub use record::{select_columns, Assign, AssignSome, FieldMut, FieldRef, Record, RecordSlot};

//! Derive macro implementations

mod record;

pub use record::derive_record;

//! Utility functions for code generation

/// Default table name for a record type: lower-cased type name plus `s`
pub fn default_table_name(type_name: &str) -> String {
    format!("{}s", type_name.to_lowercase())
}

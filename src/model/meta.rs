//! Field metadata tables
//!
//! Each record type carries one `static` [`RecordMeta`], produced by
//! `#[derive(Record)]`. It lists the fields in declaration order with their
//! annotation tags, so column lists, setter lists and conversion lookups are
//! plain slice walks with no runtime reflection.

/// Tag key holding a field's persistence column
pub const DB_TAG: &str = "db";

/// Shape of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A plain value (`T`)
    Scalar,
    /// A nullable value (`Option<T>`)
    OptionalScalar,
    /// An embedded record (`R`)
    Record,
    /// A nullable reference to a record (`Option<R>`)
    OptionalRecord,
}

impl FieldKind {
    pub fn is_record(self) -> bool {
        matches!(self, FieldKind::Record | FieldKind::OptionalRecord)
    }

    pub fn is_optional(self) -> bool {
        matches!(self, FieldKind::OptionalScalar | FieldKind::OptionalRecord)
    }
}

/// Metadata for one declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Declared Rust field name
    pub name: &'static str,
    /// Declared type, as written
    pub ty: &'static str,
    pub kind: FieldKind,
    /// Identity column, never written by generated INSERT/UPDATE lists
    pub primary_key: bool,
    /// Store-assigned column (e.g. `created_at`, `version`): read, never written
    pub generated: bool,
    /// Annotation tags in the order they were declared, e.g. `("db", "title")`
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldMeta {
    /// Raw value of the annotation `key`, if present
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// External name under `key`: the annotation value, else the declared name
    pub fn resolve(&self, key: &str) -> &'static str {
        match self.tag(key) {
            Some(value) if !value.is_empty() => value,
            _ => self.name,
        }
    }

    /// Persistence column, `None` when the field has no `db` tag or `db = "-"`
    pub fn column(&self) -> Option<&'static str> {
        self.tag(DB_TAG).filter(|c| !c.is_empty() && *c != "-")
    }

    /// Whether generated INSERT/UPDATE statements write this field
    pub fn is_writable(&self) -> bool {
        self.column().is_some() && !self.primary_key && !self.generated
    }
}

/// Metadata for a record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMeta {
    pub type_name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldMeta],
}

impl RecordMeta {
    /// Index of the field declared as `name`
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Index of the first field whose resolved name under `key` is `name`
    pub fn find_source(&self, key: &str, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.resolve(key) == name)
    }

    /// Resolved names of every field under `key`, in declaration order
    pub fn resolved_names(&self, key: &str) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.resolve(key)).collect()
    }

    /// `(index, column)` of every field that carries a persistence column
    pub fn columns(&self) -> impl Iterator<Item = (usize, &'static str)> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.column().map(|c| (i, c)))
    }

    /// `(index, column)` of every column written by generated INSERT/UPDATE lists
    pub fn writable_columns(&self) -> impl Iterator<Item = (usize, &'static str)> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_writable())
            .filter_map(|(i, f)| f.column().map(|c| (i, c)))
    }

    /// Index of the primary-key field, if one is declared
    pub fn primary_key_index(&self) -> Option<usize> {
        self.fields.iter().position(|f| f.primary_key)
    }

    /// The primary-key field, if one is declared
    pub fn primary_key(&self) -> Option<&'static FieldMeta> {
        self.fields.iter().find(|f| f.primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BOOK: RecordMeta = RecordMeta {
        type_name: "Book",
        table: "books",
        fields: &[
            FieldMeta {
                name: "id",
                ty: "i64",
                kind: FieldKind::Scalar,
                primary_key: true,
                generated: false,
                tags: &[("db", "id"), ("dto", "id")],
            },
            FieldMeta {
                name: "title",
                ty: "String",
                kind: FieldKind::Scalar,
                primary_key: false,
                generated: false,
                tags: &[("db", "title"), ("dto", "name")],
            },
            FieldMeta {
                name: "version",
                ty: "i32",
                kind: FieldKind::Scalar,
                primary_key: false,
                generated: true,
                tags: &[("db", "version")],
            },
            FieldMeta {
                name: "user",
                ty: "Option<User>",
                kind: FieldKind::OptionalRecord,
                primary_key: false,
                generated: false,
                tags: &[("db", "-")],
            },
        ],
    };

    #[test]
    fn test_resolve_prefers_annotation() {
        assert_eq!(BOOK.fields[1].resolve("dto"), "name");
        // No `json` tag: falls back to the declared name
        assert_eq!(BOOK.fields[1].resolve("json"), "title");
    }

    #[test]
    fn test_columns_skip_dash() {
        let cols: Vec<_> = BOOK.columns().map(|(_, c)| c).collect();
        assert_eq!(cols, vec!["id", "title", "version"]);
    }

    #[test]
    fn test_writable_columns_skip_pk_and_generated() {
        let cols: Vec<_> = BOOK.writable_columns().collect();
        assert_eq!(cols, vec![(1, "title")]);
    }

    #[test]
    fn test_lookup_helpers() {
        assert_eq!(BOOK.field_index("version"), Some(2));
        assert_eq!(BOOK.find_source("dto", "name"), Some(1));
        assert_eq!(BOOK.primary_key().map(|f| f.name), Some("id"));
        assert_eq!(BOOK.resolved_names("dto"), vec!["id", "name", "version", "user"]);
        assert!(BOOK.fields[3].kind.is_record());
        assert!(BOOK.fields[3].kind.is_optional());
    }
}

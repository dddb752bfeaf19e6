//! Attribute parsing utilities

use syn::{Attribute, Field, LitStr};

/// Struct-level `#[record(...)]` options
#[derive(Debug, Default)]
pub struct RecordAttributes {
    pub table: Option<String>,
}

/// Field-level `#[record(...)]` options
#[derive(Debug, Default)]
pub struct FieldAttributes {
    /// Annotation tags in the order they were written, e.g. `("db", "title")`
    pub tags: Vec<(String, String)>,
    pub primary_key: bool,
    pub nested: bool,
    pub generated: bool,
}

impl FieldAttributes {
    /// Value of the tag `key`, if the field carries it
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Persistence column, `None` when the `db` tag is absent, empty or `-`
    pub fn column(&self) -> Option<&str> {
        self.tag("db").filter(|c| !c.is_empty() && *c != "-")
    }
}

/// Parse `#[record(table = "...")]` from struct attributes
pub fn parse_record_attributes(attrs: &[Attribute]) -> syn::Result<RecordAttributes> {
    let mut parsed = RecordAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.table = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported struct-level record attribute, expected `table`"))
            }
        })?;
    }
    Ok(parsed)
}

/// Parse all `#[record(...)]` attributes on a field
///
/// Flags (`primary_key`, `nested`, `generated`) are bare paths; everything else
/// must be `key = "value"` and becomes an annotation tag. A tag key may appear
/// only once per field.
pub fn parse_field_attributes(field: &Field) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                parsed.primary_key = true;
                return Ok(());
            }
            if meta.path.is_ident("nested") {
                parsed.nested = true;
                return Ok(());
            }
            if meta.path.is_ident("generated") {
                parsed.generated = true;
                return Ok(());
            }

            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected a tag name such as `db` or `dto`"))?
                .to_string();
            let lit: LitStr = meta.value()?.parse()?;
            if parsed.tags.iter().any(|(k, _)| *k == key) {
                return Err(meta.error(format!("duplicate `{key}` tag")));
            }
            parsed.tags.push((key, lit.value()));
            Ok(())
        })?;
    }
    Ok(parsed)
}

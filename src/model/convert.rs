//! Annotation-driven record conversion
//!
//! Copies values between two differently shaped record types, typically a
//! domain model and its transport record. For every destination field the
//! engine resolves a source field under one tag key and then:
//!
//! 1. leaves the destination untouched when the source is `None` (the whole
//!    sub-tree is skipped, nothing is fabricated);
//! 2. assigns the value when both sides hold the same Rust type, after
//!    unwrapping `Option` on either side;
//! 3. recurses when both sides are records;
//! 4. recurses into an `Option<R>` destination when the source holds a record,
//!    allocating a fresh default record first only if the slot is `None`.
//!
//! Anything else is skipped. Conversion never fails; every skipped mismatch
//! and every destination field without a source counterpart is recorded in
//! the returned [`ConversionReport`].

use crate::model::meta::FieldKind;
use crate::model::record::{FieldMut, FieldRef, Record};
use std::fmt;

const LOG_TARGET: &str = "shelfmap::convert";

/// Why a destination field was not populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The source type has no field with the resolved name
    Unmatched,
    /// Both sides hold values of different Rust types
    TypeMismatch {
        source: &'static str,
        destination: &'static str,
    },
    /// One side holds a record and the other a value
    ShapeMismatch {
        source: FieldKind,
        destination: FieldKind,
    },
}

/// One skipped destination field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionIssue {
    /// Dotted path of declared destination field names, e.g. `user.name`
    pub path: String,
    pub kind: IssueKind,
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Unmatched => write!(f, "{}: no source field", self.path),
            IssueKind::TypeMismatch {
                source,
                destination,
            } => write!(
                f,
                "{}: cannot assign {} to {}",
                self.path, source, destination
            ),
            IssueKind::ShapeMismatch {
                source,
                destination,
            } => write!(
                f,
                "{}: cannot convert {:?} field into {:?} field",
                self.path, source, destination
            ),
        }
    }
}

/// Diagnostics collected during one conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn issues(&self) -> &[ConversionIssue] {
        &self.issues
    }

    /// No issues of any kind
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues other than unmatched fields, i.e. values that existed but could
    /// not be carried over
    pub fn mismatches(&self) -> impl Iterator<Item = &ConversionIssue> {
        self.issues
            .iter()
            .filter(|i| !matches!(i.kind, IssueKind::Unmatched))
    }

    /// Append the issues of another report
    pub fn merge(&mut self, other: ConversionReport) {
        self.issues.extend(other.issues);
    }

    fn push(&mut self, path: String, kind: IssueKind) {
        let issue = ConversionIssue { path, kind };
        log::debug!(target: LOG_TARGET, "conversion skipped {}", issue);
        self.issues.push(issue);
    }
}

/// A converted record together with its diagnostics
#[derive(Debug, Clone)]
pub struct Converted<D> {
    pub value: D,
    pub report: ConversionReport,
}

impl<D> Converted<D> {
    pub fn into_inner(self) -> D {
        self.value
    }
}

/// Convert `source` into a fresh `D` using the tag `tag`
///
/// # Example
///
/// ```rust
/// use shelfmap::{convert, Record};
///
/// #[derive(Default, Record)]
/// struct User {
///     #[record(db = "id", primary_key, dto = "id")]
///     id: i64,
///     #[record(db = "name", dto = "name")]
///     name: String,
/// }
///
/// #[derive(Default, Record)]
/// struct UserDto {
///     #[record(dto = "id")]
///     id: Option<i64>,
///     #[record(dto = "name")]
///     display_name: Option<String>,
/// }
///
/// let user = User { id: 7, name: "Ada".to_string() };
/// let dto = convert::<User, UserDto>(&user, "dto");
/// assert!(dto.report.is_clean());
/// assert_eq!(dto.value.display_name.as_deref(), Some("Ada"));
/// ```
pub fn convert<S: Record, D: Record + Default>(source: &S, tag: &str) -> Converted<D> {
    let mut value = D::default();
    let report = convert_into(source, &mut value, tag);
    Converted { value, report }
}

/// Populate an existing destination from `source`
///
/// Fields the source cannot supply keep their current values.
pub fn convert_into(source: &dyn Record, destination: &mut dyn Record, tag: &str) -> ConversionReport {
    let mut report = ConversionReport::default();
    convert_fields(source, destination, tag, "", &mut report);
    report
}

/// Convert an optional source; `None` stays `None` and produces a clean report
pub fn convert_optional<S: Record, D: Record + Default>(
    source: Option<&S>,
    tag: &str,
) -> (Option<D>, ConversionReport) {
    match source {
        Some(source) => {
            let converted = convert::<S, D>(source, tag);
            (Some(converted.value), converted.report)
        }
        None => (None, ConversionReport::default()),
    }
}

fn convert_fields(
    source: &dyn Record,
    destination: &mut dyn Record,
    tag: &str,
    path: &str,
    report: &mut ConversionReport,
) {
    let source_meta = source.record_meta();
    let destination_meta = destination.record_meta();

    for (index, destination_field) in destination_meta.fields.iter().enumerate() {
        let field_path = if path.is_empty() {
            destination_field.name.to_string()
        } else {
            format!("{path}.{}", destination_field.name)
        };

        let wanted = destination_field.resolve(tag);
        let Some(source_index) = source_meta
            .field_index(wanted)
            .or_else(|| source_meta.find_source(tag, wanted))
        else {
            report.push(field_path, IssueKind::Unmatched);
            continue;
        };
        let source_field = &source_meta.fields[source_index];

        let (Some(source_ref), Some(target)) =
            (source.field(source_index), destination.field_mut(index))
        else {
            continue;
        };

        match (source_ref, target) {
            (FieldRef::Null, _) => {}
            (FieldRef::Value(value), FieldMut::Value(target)) => {
                if !target.assign_from(value) {
                    report.push(field_path, type_mismatch(source_field.ty, destination_field.ty));
                }
            }
            (FieldRef::Value(value), FieldMut::Optional(target)) => {
                if !target.assign_some(value) {
                    report.push(field_path, type_mismatch(source_field.ty, destination_field.ty));
                }
            }
            (FieldRef::Record(nested), FieldMut::Record(target)) => {
                convert_fields(nested, target, tag, &field_path, report);
            }
            (FieldRef::Record(nested), FieldMut::OptionalRecord(slot)) => {
                if slot.get().is_none() {
                    slot.allocate();
                }
                if let Some(target) = slot.get_mut() {
                    convert_fields(nested, target, tag, &field_path, report);
                }
            }
            _ => report.push(
                field_path,
                IssueKind::ShapeMismatch {
                    source: source_field.kind,
                    destination: destination_field.kind,
                },
            ),
        }
    }
}

fn type_mismatch(source: &'static str, destination: &'static str) -> IssueKind {
    IssueKind::TypeMismatch {
        source,
        destination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmap_derive::Record;

    #[derive(Debug, Clone, Default, PartialEq, Record)]
    struct Owner {
        #[record(db = "id", primary_key)]
        id: i64,
        #[record(db = "name")]
        name: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Record)]
    struct OwnerDto {
        id: Option<i64>,
        #[record(dto = "name")]
        label: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Record)]
    struct Item {
        #[record(db = "id", primary_key)]
        id: i64,
        #[record(db = "pages")]
        pages: i32,
        #[record(nested)]
        owner: Option<Owner>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Record)]
    struct ItemDto {
        id: Option<i64>,
        pages: Option<i64>,
        #[record(nested)]
        owner: Option<OwnerDto>,
        extra: Option<String>,
    }

    #[test]
    fn test_nested_allocation_and_rename() {
        let item = Item {
            id: 1,
            pages: 10,
            owner: Some(Owner {
                id: 2,
                name: "Ada".to_string(),
            }),
        };
        let converted = convert::<Item, ItemDto>(&item, "dto");
        let owner = converted.value.owner.expect("owner allocated");
        assert_eq!(owner.id, Some(2));
        assert_eq!(owner.label.as_deref(), Some("Ada"));
        assert_eq!(converted.value.id, Some(1));
    }

    #[test]
    fn test_none_source_stays_none() {
        let item = Item {
            id: 1,
            pages: 10,
            owner: None,
        };
        let converted = convert::<Item, ItemDto>(&item, "dto");
        assert!(converted.value.owner.is_none());
    }

    #[test]
    fn test_mismatch_is_reported_not_fatal() {
        let item = Item {
            id: 1,
            pages: 10,
            owner: None,
        };
        let converted = convert::<Item, ItemDto>(&item, "dto");
        // i32 -> Option<i64> is not an exact type match
        assert_eq!(converted.value.pages, None);

        let mismatches: Vec<_> = converted.report.mismatches().collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "pages");
        assert!(matches!(
            mismatches[0].kind,
            IssueKind::TypeMismatch { source: "i32", destination: "Option<i64>" }
        ));

        // `extra` has no counterpart on Item
        assert!(converted
            .report
            .issues()
            .iter()
            .any(|i| i.path == "extra" && i.kind == IssueKind::Unmatched));
    }

    #[test]
    fn test_convert_into_keeps_unsupplied_fields() {
        let dto = OwnerDto {
            id: None,
            label: Some("Grace".to_string()),
        };
        let mut owner = Owner {
            id: 9,
            name: "old".to_string(),
        };
        let report = convert_into(&dto, &mut owner, "dto");
        assert!(report.is_clean());
        assert_eq!(owner.id, 9);
        assert_eq!(owner.name, "Grace");
    }

    #[test]
    fn test_convert_into_keeps_populated_nested_record() {
        let patch = ItemDto {
            owner: Some(OwnerDto {
                id: Some(2),
                label: None,
            }),
            ..ItemDto::default()
        };
        let mut item = Item {
            id: 1,
            pages: 10,
            owner: Some(Owner {
                id: 1,
                name: "Ada".to_string(),
            }),
        };

        convert_into(&patch, &mut item, "dto");
        assert_eq!(
            item.owner,
            Some(Owner {
                id: 2,
                name: "Ada".to_string(),
            })
        );
        assert_eq!(item.id, 1);
        assert_eq!(item.pages, 10);
    }

    #[test]
    fn test_convert_optional_none() {
        let (converted, report) = convert_optional::<Owner, OwnerDto>(None, "dto");
        assert!(converted.is_none());
        assert!(report.is_clean());
    }
}

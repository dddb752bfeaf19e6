//! The `Record` trait and its field accessors
//!
//! A record exposes its fields by declaration index. Reads go through
//! [`FieldRef`], writes through [`FieldMut`]; both erase the concrete field type
//! so the conversion engine can walk two unrelated record types side by side.

use crate::model::meta::RecordMeta;
use crate::value::ValueExtractionError;
use sea_query::Value;
use std::any::{type_name, Any};

/// A type with a compile-time metadata table and index-based field access
///
/// Implemented by `#[derive(Record)]`; hand-written impls must keep every
/// method consistent with the metadata table returned by `meta()`.
///
/// Scalar fields must be `Clone + 'static`; fields carrying a `db` column must
/// also implement `ValueType` and `TryGetable`. Nested record fields must be
/// records themselves (and `Default` when declared as `Option<R>`).
pub trait Record {
    /// Metadata table for this type
    fn meta() -> &'static RecordMeta
    where
        Self: Sized;

    /// Metadata table for this value's type (object-safe form of `meta()`)
    fn record_meta(&self) -> &'static RecordMeta;

    /// Read access to field `index`, `None` if out of range
    fn field(&self, index: usize) -> Option<FieldRef<'_>>;

    /// Write access to field `index`, `None` if out of range
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;

    /// Bindable value of field `index`
    ///
    /// `None` for fields without a persistence column. A nested record field
    /// with a column yields the nested record's primary key, or the typed NULL
    /// of that key when the reference is `None`.
    fn column_value(&self, index: usize) -> Option<Value>;

    /// Store a scanned column value into field `index`
    fn scan_field(&mut self, index: usize, value: Value) -> Result<(), ValueExtractionError>;

    /// Value of the primary-key field, `None` if the record declares none
    fn primary_key_value(&self) -> Option<Value>;

    /// Typed NULL of the primary-key column, `None` if the record declares none
    fn null_primary_key() -> Option<Value>
    where
        Self: Sized;

    /// Store a scanned value into the primary-key field; a no-op without one
    fn scan_primary_key(&mut self, value: Value) -> Result<(), ValueExtractionError> {
        match self.record_meta().primary_key_index() {
            Some(index) => self.scan_field(index, value),
            None => Ok(()),
        }
    }
}

/// Read view of one field
pub enum FieldRef<'a> {
    /// A present scalar (the inner value for `Option<T>`)
    Value(&'a dyn Any),
    /// A present nested record
    Record(&'a dyn Record),
    /// `None` in an `Option` field
    Null,
}

impl<'a> FieldRef<'a> {
    pub fn from_option<T: Any>(value: &'a Option<T>) -> Self {
        match value {
            Some(v) => FieldRef::Value(v),
            None => FieldRef::Null,
        }
    }

    pub fn from_record_option<R: Record>(value: &'a Option<R>) -> Self {
        match value {
            Some(r) => FieldRef::Record(r),
            None => FieldRef::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldRef::Null)
    }
}

/// Write view of one field
pub enum FieldMut<'a> {
    /// A scalar `T`
    Value(&'a mut dyn Assign),
    /// A nullable scalar `Option<T>`
    Optional(&'a mut dyn AssignSome),
    /// An embedded record `R`
    Record(&'a mut dyn Record),
    /// A nullable record reference `Option<R>`
    OptionalRecord(&'a mut dyn RecordSlot),
}

/// Assignment from an erased value of exactly the same type
pub trait Assign {
    /// Overwrite `self` with a clone of `source` if it is a `Self`.
    /// Returns `false`, leaving `self` untouched, on a type mismatch.
    fn assign_from(&mut self, source: &dyn Any) -> bool;

    fn type_name(&self) -> &'static str;
}

impl<T: Any + Clone> Assign for T {
    fn assign_from(&mut self, source: &dyn Any) -> bool {
        match source.downcast_ref::<T>() {
            Some(value) => {
                *self = value.clone();
                true
            }
            None => false,
        }
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Assignment of `Some(value)` into an `Option<T>` from an erased `T`
pub trait AssignSome {
    /// Set `self` to `Some(source.clone())` if `source` is a `T`.
    /// Returns `false`, leaving `self` untouched, on a type mismatch.
    fn assign_some(&mut self, source: &dyn Any) -> bool;

    fn inner_type_name(&self) -> &'static str;
}

impl<T: Any + Clone> AssignSome for Option<T> {
    fn assign_some(&mut self, source: &dyn Any) -> bool {
        match source.downcast_ref::<T>() {
            Some(value) => {
                *self = Some(value.clone());
                true
            }
            None => false,
        }
    }

    fn inner_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// An `Option<R>` slot holding a nested record
pub trait RecordSlot {
    fn get(&self) -> Option<&dyn Record>;

    fn get_mut(&mut self) -> Option<&mut dyn Record>;

    /// Replace the slot's content with a fresh default record and return it
    fn allocate(&mut self) -> &mut dyn Record;

    fn clear(&mut self);
}

impl<R: Record + Default> RecordSlot for Option<R> {
    fn get(&self) -> Option<&dyn Record> {
        self.as_ref().map(|r| r as &dyn Record)
    }

    fn get_mut(&mut self) -> Option<&mut dyn Record> {
        self.as_mut().map(|r| r as &mut dyn Record)
    }

    fn allocate(&mut self) -> &mut dyn Record {
        self.insert(R::default())
    }

    fn clear(&mut self) {
        *self = None;
    }
}

/// Comma-separated, alias-qualified column list of `T`, in declaration order
///
/// ```rust
/// # use shelfmap::{select_columns, Record};
/// #[derive(Default, Record)]
/// struct User {
///     #[record(db = "id", primary_key)]
///     id: i64,
///     #[record(db = "name")]
///     name: String,
/// }
///
/// assert_eq!(select_columns::<User>("u"), "u.id, u.name");
/// ```
pub fn select_columns<T: Record>(alias: &str) -> String {
    T::meta()
        .columns()
        .map(|(_, column)| format!("{alias}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

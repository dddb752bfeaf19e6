//! ValueType trait for type-safe value conversions
//!
//! The `ValueType` trait maps Rust types to their corresponding `sea_query::Value` variant.
//! Every scalar field of a record with a `db` column goes through it when the record is
//! bound into a statement, and every named-query parameter goes through it when bound.
//!
//! ## Usage
//!
//! ```rust
//! use shelfmap::ValueType;
//! use sea_query::Value;
//!
//! let value = ValueType::into_value(42i32);
//! assert!(matches!(value, Value::Int(Some(42))));
//! ```
//!
//! ## Implementation
//!
//! Implemented for:
//!
//! - Integer types: `i16`, `i32`, `i64`
//! - Floating point: `f32`, `f64`
//! - Boolean: `bool`
//! - String: `String`
//! - Binary: `Vec<u8>`
//! - JSON: `serde_json::Value`
//! - Time: `chrono::NaiveDate`, `chrono::NaiveDateTime`, `chrono::DateTime<Utc>`
//! - `Option<T>` for all above types (`None` becomes the typed NULL of `T`)

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::Value;

/// Trait for mapping Rust types to their corresponding `sea_query::Value` variant.
///
/// Application enums stored as integers implement this by hand, see
/// `bookshelf::ReadingStatus` for an example.
///
/// ## Example
///
/// ```rust
/// use shelfmap::ValueType;
/// use sea_query::Value;
///
/// let value = ValueType::into_value(Some(42i64));
/// assert!(matches!(value, Value::BigInt(Some(42))));
///
/// let value = ValueType::into_value(None::<i64>);
/// assert!(matches!(value, Value::BigInt(None)));
/// ```
pub trait ValueType: Sized {
    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Convert a `sea_query::Value` into this type, if possible.
    ///
    /// Returns `None` if the value doesn't match the expected variant or is null.
    fn from_value(value: Value) -> Option<Self>;

    /// Return the null variant for this type.
    ///
    /// Used by `Option<T>` so that `None` is bound with the column's type rather
    /// than an untyped NULL.
    fn null_value() -> Value;
}

macro_rules! impl_value_type {
    ($type:ty, $variant:ident) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(Some(v)) => Some(v),
                    _ => None,
                }
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_value_type!(i16, SmallInt);
impl_value_type!(i32, Int);
impl_value_type!(i64, BigInt);
impl_value_type!(f32, Float);
impl_value_type!(f64, Double);
impl_value_type!(bool, Bool);
impl_value_type!(String, String);
impl_value_type!(Vec<u8>, Bytes);
impl_value_type!(NaiveDate, ChronoDate);
impl_value_type!(NaiveDateTime, ChronoDateTime);
impl_value_type!(DateTime<Utc>, ChronoDateTimeUtc);

impl ValueType for serde_json::Value {
    fn into_value(self) -> Value {
        Value::Json(Some(Box::new(self)))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Json(Some(v)) => Some(*v),
            _ => None,
        }
    }

    fn null_value() -> Value {
        Value::Json(None)
    }
}

impl ValueType for &str {
    fn into_value(self) -> Value {
        Value::String(Some(self.to_string()))
    }

    // Borrowed strings cannot be produced from an owned value
    fn from_value(_value: Value) -> Option<Self> {
        None
    }

    fn null_value() -> Value {
        Value::String(None)
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => T::into_value(v),
            None => T::null_value(),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match T::from_value(value.clone()) {
            Some(v) => Some(Some(v)),
            None if value == T::null_value() => Some(None),
            None => None,
        }
    }

    fn null_value() -> Value {
        T::null_value()
    }
}

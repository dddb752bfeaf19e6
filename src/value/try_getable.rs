//! TryGetable trait for safe value extraction
//!
//! Row scanning goes through this trait: every scalar record field with a `db`
//! column is filled with `TryGetable::try_get` (or `try_get_opt` for `Option<T>`).

use crate::value::ValueType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch { expected: String, actual: String },
    /// The row has no value at the requested position
    MissingColumn(usize),
    /// Value conversion failed (e.g., overflow, invalid format)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            ValueExtractionError::MissingColumn(index) => {
                write!(f, "Row has no column at position {}", index)
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// Distinguishes a NULL from a value of the wrong type, which `ValueType::from_value`
/// cannot.
///
/// ## Usage
///
/// ```rust
/// use shelfmap::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::Int(Some(42)));
/// assert_eq!(result, Ok(42));
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::Int(None));
/// assert!(matches!(result, Err(ValueExtractionError::NullValue)));
/// ```
pub trait TryGetable: ValueType {
    /// Try to extract a value from `sea_query::Value`, returning an error if extraction fails.
    ///
    /// Returns:
    /// - `Ok(T)` if the value matches the expected type and is not null
    /// - `Err(ValueExtractionError::NullValue)` if the value is null
    /// - `Err(ValueExtractionError::TypeMismatch)` if the value type doesn't match
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;

    /// Try to extract a value, allowing null values to return `None`.
    fn try_get_opt(value: Value) -> Result<Option<Self>, ValueExtractionError> {
        match Self::try_get(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

macro_rules! impl_try_getable {
    ($type:ty, $variant:ident, $expected:expr) => {
        impl TryGetable for $type {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                match value {
                    Value::$variant(Some(v)) => Ok(v),
                    Value::$variant(None) => Err(ValueExtractionError::NullValue),
                    _ => Err(ValueExtractionError::TypeMismatch {
                        expected: $expected.to_string(),
                        actual: format!("{:?}", value),
                    }),
                }
            }
        }
    };
}

impl_try_getable!(i16, SmallInt, "SmallInt");
impl_try_getable!(i32, Int, "Int");
impl_try_getable!(i64, BigInt, "BigInt");
impl_try_getable!(f32, Float, "Float");
impl_try_getable!(f64, Double, "Double");
impl_try_getable!(bool, Bool, "Bool");
impl_try_getable!(String, String, "String");
impl_try_getable!(Vec<u8>, Bytes, "Bytes");
impl_try_getable!(NaiveDate, ChronoDate, "ChronoDate");
impl_try_getable!(NaiveDateTime, ChronoDateTime, "ChronoDateTime");
impl_try_getable!(DateTime<Utc>, ChronoDateTimeUtc, "ChronoDateTimeUtc");

impl TryGetable for serde_json::Value {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(v)) => Ok(*v),
            Value::Json(None) => Err(ValueExtractionError::NullValue),
            _ => Err(ValueExtractionError::TypeMismatch {
                expected: "Json".to_string(),
                actual: format!("{:?}", value),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_get_success() {
        assert_eq!(<i64 as TryGetable>::try_get(Value::BigInt(Some(7))), Ok(7));
        assert_eq!(
            <String as TryGetable>::try_get(Value::String(Some("x".to_string()))),
            Ok("x".to_string())
        );
    }

    #[test]
    fn test_try_get_null() {
        let result = <i64 as TryGetable>::try_get(Value::BigInt(None));
        assert_eq!(result, Err(ValueExtractionError::NullValue));
    }

    #[test]
    fn test_try_get_type_mismatch() {
        let result = <i32 as TryGetable>::try_get(Value::BigInt(Some(1)));
        assert!(matches!(
            result,
            Err(ValueExtractionError::TypeMismatch { ref expected, .. }) if expected == "Int"
        ));
    }

    #[test]
    fn test_try_get_opt() {
        assert_eq!(<i32 as TryGetable>::try_get_opt(Value::Int(None)), Ok(None));
        assert_eq!(<i32 as TryGetable>::try_get_opt(Value::Int(Some(3))), Ok(Some(3)));
        assert!(<i32 as TryGetable>::try_get_opt(Value::Bool(None)).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ValueExtractionError::MissingColumn(4);
        assert!(err.to_string().contains("position 4"));
    }
}

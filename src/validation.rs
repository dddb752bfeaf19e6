//! Field-scoped validation errors
//!
//! A [`Validator`] accumulates one message per field; the first message for a
//! field wins. The collected [`ValidationErrors`] serialize as a flat
//! `{"field": "message"}` object.

use crate::executor::ShelfError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to message, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding exactly one field error
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record `message` for `field` unless the field already has one
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Accumulates validation failures before any statement runs
///
/// # Example
///
/// ```rust
/// use shelfmap::Validator;
///
/// let mut v = Validator::new();
/// v.check(!"".is_empty(), "title", "must be provided");
/// v.check(10 > 0, "pages", "must be positive");
/// assert!(!v.valid());
/// assert_eq!(v.errors().get("title"), Some("must be provided"));
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no error has been recorded
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Record `message` for `field` when `ok` is false
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// `Ok(())` when valid, else `ShelfError::Validation` with every recorded error
    pub fn into_result(self) -> Result<(), ShelfError> {
        if self.valid() {
            Ok(())
        } else {
            Err(ShelfError::Validation(self.errors))
        }
    }
}

/// Whether `value` is one of `permitted`
pub fn permitted_value<T: PartialEq + ?Sized>(value: &T, permitted: &[&T]) -> bool {
    permitted.iter().any(|p| *p == value)
}

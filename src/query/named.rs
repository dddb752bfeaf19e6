//! Named-parameter query rewriting
//!
//! Templates use `:identifier` placeholders (letters, digits, underscore). The
//! rewriter scans left to right, replaces every occurrence with the next
//! PostgreSQL marker and appends the bound value, so a repeated identifier
//! takes one marker and one copy of its value per occurrence.
//!
//! A `::` pair is a PostgreSQL cast and is copied as is, which lets templates
//! write `:start::timestamptz`. Colons inside string literals are not
//! recognised; templates must not put `:word` sequences inside literals.

use crate::executor::ShelfError;
use crate::query::statement::Statement;
use crate::value::ValueType;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::Value;
use std::collections::BTreeMap;

static NAMED_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"::|:([A-Za-z0-9_]+)").expect("named placeholder pattern should be valid")
});

/// Identifier to value map consumed by [`named_query`]
///
/// # Example
///
/// ```rust
/// use shelfmap::query::NamedParams;
///
/// let params = NamedParams::new()
///     .bind("title", "Dune")
///     .bind("userID", 7i64);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    values: BTreeMap<String, Value>,
}

impl NamedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`, replacing any earlier binding
    #[must_use]
    pub fn bind<V: ValueType>(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind an already converted value
    #[must_use]
    pub fn bind_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// In-place form of [`bind`](Self::bind); returns the replaced value
    pub fn insert<V: ValueType>(&mut self, name: impl Into<String>, value: V) -> Option<Value> {
        self.values.insert(name.into(), value.into_value())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for NamedParams {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Rewrite `template` into a positional [`Statement`]
///
/// # Errors
///
/// Returns `ShelfError::MissingParameter` naming the first identifier that has
/// no entry in `params`. No statement is produced in that case.
///
/// # Example
///
/// ```rust
/// use shelfmap::query::{named_query, NamedParams};
///
/// let params = NamedParams::new().bind("id", 1i64).bind("user_id", 7i64);
/// let statement = named_query(
///     "SELECT id FROM books WHERE id = :id AND user_id = :user_id AND :id > 0",
///     &params,
/// )?;
/// assert_eq!(
///     statement.sql,
///     "SELECT id FROM books WHERE id = $1 AND user_id = $2 AND $3 > 0"
/// );
/// assert_eq!(statement.values.len(), 3);
/// # Ok::<(), shelfmap::ShelfError>(())
/// ```
pub fn named_query(template: &str, params: &NamedParams) -> Result<Statement, ShelfError> {
    let mut sql = String::with_capacity(template.len());
    let mut values = Vec::new();
    let mut copied = 0;

    for captures in NAMED_PLACEHOLDER.captures_iter(template) {
        // `::` has no identifier group and stays in the copied text
        let (Some(token), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = params
            .get(name.as_str())
            .ok_or_else(|| ShelfError::MissingParameter(name.as_str().to_string()))?;

        sql.push_str(&template[copied..token.start()]);
        values.push(value.clone());
        sql.push('$');
        sql.push_str(&values.len().to_string());
        copied = token.end();
    }
    sql.push_str(&template[copied..]);

    Ok(Statement { sql, values })
}

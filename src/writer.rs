//! Versioned writes with optimistic concurrency
//!
//! Every persisted entity owns an immutable `id`, a `version` counter that
//! starts at 1 and grows by one per successful update, and a `deleted` flag.
//! [`VersionedWriter`] runs the three mutations inside a caller's
//! [`Transaction`]:
//!
//! - **insert** returns the store-assigned id, creation time and version;
//! - **update** bumps `version` only when identity, the caller's current
//!   version, `deleted = false` and ownership all match. Zero rows is an edit
//!   conflict; a stale version and a missing or foreign row look the same
//!   from the row count alone, so both report `EditConflict`;
//! - **soft delete** sets `deleted = true`; zero rows is `NotFound`.
//!
//! Before each statement the writer sets `statement_timeout` for the rest of
//! the transaction, so a slow write fails with `ShelfError::Timeout` instead of
//! hanging. Constraint violations named in the writer's [`ConstraintMap`]
//! come back as field-scoped validation errors.

use crate::config::ShelfConfig;
use crate::executor::{ShelfError, ShelfExecutor};
use crate::model::Record;
use crate::query::{
    log_statement, BuildStatement, Column, Condition, InsertBuilder, Statement, UpdateBuilder,
};
use crate::transaction::Transaction;
use crate::validation::ValidationErrors;
use crate::value::ValueType;
use chrono::{DateTime, Utc};
use sea_query::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Columns returned by a versioned insert, in this order
pub const INSERT_RETURNING: [&str; 3] = ["id", "created_at", "version"];

/// A record with an optimistic-concurrency version
pub trait Versioned: Record {
    fn version(&self) -> i32;

    fn set_version(&mut self, version: i32);

    /// Store the creation time assigned by the store; ignored by default
    fn set_created_at(&mut self, _created_at: DateTime<Utc>) {}

    /// Copy the identity, creation time and version of a fresh insert
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::ParseError` when the primary key is not an `i64`.
    fn apply_inserted(&mut self, inserted: &Inserted) -> Result<(), ShelfError> {
        self.scan_primary_key(Value::BigInt(Some(inserted.id)))?;
        self.set_created_at(inserted.created_at);
        self.set_version(inserted.version);
        Ok(())
    }
}

/// Values the store assigns on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

/// Ownership predicate added to updates and deletes, e.g. `user_id = 7`
#[derive(Debug, Clone, PartialEq)]
pub struct Ownership {
    pub column: String,
    pub value: Value,
}

impl Ownership {
    pub fn new<V: ValueType>(column: impl Into<String>, value: V) -> Self {
        Self {
            column: column.into(),
            value: value.into_value(),
        }
    }

    fn condition(&self) -> Condition {
        Condition::raw(format!("{} = ?", self.column), vec![self.value.clone()])
    }
}

/// Constraint name to the field error it stands for
///
/// ```rust
/// use shelfmap::writer::ConstraintMap;
/// use shelfmap::ShelfError;
///
/// let constraints = ConstraintMap::new()
///     .with("chk_books_pages_positive", "pages", "pages must be a positive number");
///
/// let err = constraints.translate(ShelfError::ConstraintViolation {
///     constraint: "chk_books_pages_positive".to_string(),
///     message: "new row violates check constraint".to_string(),
/// });
/// assert_eq!(
///     err.validation_errors().and_then(|e| e.get("pages")),
///     Some("pages must be a positive number")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintMap {
    entries: BTreeMap<String, (String, String)>,
}

impl ConstraintMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(
        mut self,
        constraint: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.entries
            .insert(constraint.into(), (field.into(), message.into()));
        self
    }

    /// Field and message registered for `constraint`
    pub fn get(&self, constraint: &str) -> Option<(&str, &str)> {
        self.entries
            .get(constraint)
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Known constraint violations become `ShelfError::Validation`; every
    /// other error is returned unchanged
    pub fn translate(&self, err: ShelfError) -> ShelfError {
        if let ShelfError::ConstraintViolation { constraint, .. } = &err {
            if let Some((field, message)) = self.get(constraint) {
                return ValidationErrors::single(field, message).into();
            }
        }
        err
    }
}

/// Runs versioned mutations inside a transaction
#[derive(Debug, Clone)]
pub struct VersionedWriter {
    statement_timeout: Duration,
    constraints: ConstraintMap,
}

impl Default for VersionedWriter {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

impl VersionedWriter {
    pub fn new(statement_timeout: Duration) -> Self {
        Self {
            statement_timeout,
            constraints: ConstraintMap::new(),
        }
    }

    pub fn from_config(config: &ShelfConfig) -> Self {
        Self::new(config.statement_timeout())
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: ConstraintMap) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    pub fn constraints(&self) -> &ConstraintMap {
        &self.constraints
    }

    /// Run an insert whose statement returns `id, created_at, version`
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::NotFound` if the statement returned no row,
    /// `ShelfError::Validation` for a known constraint, `ShelfError::Timeout`
    /// when the budget is exceeded, or the underlying error.
    pub fn insert<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        statement: &Statement,
    ) -> Result<Inserted, ShelfError> {
        self.run(tx, statement, |tx| {
            let row = tx
                .query_opt(&statement.sql, &statement.values)?
                .ok_or(ShelfError::NotFound)?;
            Ok(Inserted {
                id: row.try_get(0)?,
                created_at: row.try_get(1)?,
                version: row.try_get(2)?,
            })
        })
    }

    /// Run an update whose statement returns the new `version`
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::EditConflict` if no row matched, otherwise as
    /// [`insert`](Self::insert).
    pub fn update<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        statement: &Statement,
    ) -> Result<i32, ShelfError> {
        self.run(tx, statement, |tx| {
            let row = tx
                .query_opt(&statement.sql, &statement.values)?
                .ok_or(ShelfError::EditConflict)?;
            Ok(row.try_get(0)?)
        })
    }

    /// Run a soft delete
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::NotFound` if no row was affected, otherwise as
    /// [`insert`](Self::insert).
    pub fn soft_delete<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        statement: &Statement,
    ) -> Result<(), ShelfError> {
        self.run(tx, statement, |tx| {
            match tx.execute(&statement.sql, &statement.values)? {
                0 => Err(ShelfError::NotFound),
                _ => Ok(()),
            }
        })
    }

    /// Insert `model` from its metadata and store the assigned values in it
    ///
    /// # Errors
    ///
    /// As [`insert`](Self::insert).
    pub fn insert_model<E, T>(&self, tx: &Transaction<'_, E>, model: &mut T) -> Result<(), ShelfError>
    where
        E: ShelfExecutor + ?Sized,
        T: Versioned,
    {
        let builder = InsertBuilder::from_model(&*model);
        self.insert_model_with(tx, model, builder)
    }

    /// Like [`insert_model`](Self::insert_model) with a caller-extended builder,
    /// e.g. one that adds a `created_by` column
    ///
    /// # Errors
    ///
    /// As [`insert`](Self::insert).
    pub fn insert_model_with<E, T>(
        &self,
        tx: &Transaction<'_, E>,
        model: &mut T,
        builder: InsertBuilder,
    ) -> Result<(), ShelfError>
    where
        E: ShelfExecutor + ?Sized,
        T: Versioned,
    {
        let statement = builder.returning(INSERT_RETURNING).build();
        let inserted = self.insert(tx, &statement)?;
        model.apply_inserted(&inserted)
    }

    /// Versioned update of `model` from its metadata
    ///
    /// On success the model carries the new version; on any error its version
    /// is left as it was.
    ///
    /// # Errors
    ///
    /// As [`update`](Self::update), or `ShelfError::Other` when the model has
    /// no primary key.
    pub fn update_model<E, T>(
        &self,
        tx: &Transaction<'_, E>,
        model: &mut T,
        ownership: Option<&Ownership>,
    ) -> Result<(), ShelfError>
    where
        E: ShelfExecutor + ?Sized,
        T: Versioned,
    {
        let builder = UpdateBuilder::from_model(&*model);
        self.update_model_with(tx, model, builder, ownership)
    }

    /// Like [`update_model`](Self::update_model) with a caller-extended builder,
    /// e.g. one that sets `updated_by`
    ///
    /// The writer adds `version = version + 1`, `updated_at = now()` and the
    /// identity, version, `deleted = false` and ownership conditions.
    ///
    /// # Errors
    ///
    /// As [`update_model`](Self::update_model).
    pub fn update_model_with<E, T>(
        &self,
        tx: &Transaction<'_, E>,
        model: &mut T,
        builder: UpdateBuilder,
        ownership: Option<&Ownership>,
    ) -> Result<(), ShelfError>
    where
        E: ShelfExecutor + ?Sized,
        T: Versioned,
    {
        let (pk_column, pk_value) = identity(&*model)?;
        let mut builder = builder
            .set_raw("version = version + 1")
            .set_raw("updated_at = now()")
            .filter(Condition::raw(format!("{pk_column} = ?"), vec![pk_value]))
            .filter(Column::bare("version").eq(model.version()))
            .filter(Condition::raw("deleted = false", Vec::new()));
        if let Some(ownership) = ownership {
            builder = builder.filter(ownership.condition());
        }

        let statement = builder.returning(["version"]).build();
        let version = self.update(tx, &statement)?;
        model.set_version(version);
        Ok(())
    }

    /// Soft-delete the `T` row with primary key `id`
    ///
    /// # Errors
    ///
    /// As [`soft_delete`](Self::soft_delete), or `ShelfError::Other` when `T`
    /// has no primary key.
    pub fn soft_delete_model<T, E, V>(
        &self,
        tx: &Transaction<'_, E>,
        id: V,
        ownership: Option<&Ownership>,
    ) -> Result<(), ShelfError>
    where
        T: Record,
        E: ShelfExecutor + ?Sized,
        V: ValueType,
    {
        let meta = T::meta();
        let pk_column = meta
            .primary_key()
            .and_then(|pk| pk.column())
            .ok_or_else(|| ShelfError::Other(format!("{} has no primary key", meta.type_name)))?;

        let mut builder = UpdateBuilder::table(meta.table)
            .set_raw("deleted = true")
            .set_raw("updated_at = now()")
            .filter(Column::bare(pk_column).eq(id))
            .filter(Condition::raw("deleted = false", Vec::new()));
        if let Some(ownership) = ownership {
            builder = builder.filter(ownership.condition());
        }

        self.soft_delete(tx, &builder.build())
    }

    fn run<E, R, F>(&self, tx: &Transaction<'_, E>, statement: &Statement, f: F) -> Result<R, ShelfError>
    where
        E: ShelfExecutor + ?Sized,
        F: FnOnce(&Transaction<'_, E>) -> Result<R, ShelfError>,
    {
        tx.execute(
            &format!(
                "SET LOCAL statement_timeout = {}",
                self.statement_timeout.as_millis()
            ),
            &[],
        )?;
        log_statement(statement);
        f(tx).map_err(|err| self.constraints.translate(err))
    }
}

fn identity(model: &dyn Record) -> Result<(&'static str, Value), ShelfError> {
    let meta = model.record_meta();
    let column = meta.primary_key().and_then(|pk| pk.column());
    match (column, model.primary_key_value()) {
        (Some(column), Some(value)) => Ok((column, value)),
        _ => Err(ShelfError::Other(format!(
            "{} has no primary key",
            meta.type_name
        ))),
    }
}

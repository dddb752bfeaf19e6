//! Driver-independent result rows
//!
//! Executors hand back `ValueRow`s rather than driver rows so that pagination,
//! record scanning and tests never depend on a live connection. A `RowCursor`
//! walks a row left to right and fills records positionally.

use crate::executor::ShelfError;
use crate::model::{FieldMut, Record};
use crate::value::{TryGetable, ValueExtractionError};
use sea_query::Value;

/// One result row: column names and their values, in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl ValueRow {
    /// Build a row from column names and values of the same length
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build an anonymous row (no column names)
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            columns: Vec::new(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the first column called `name`
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    /// Extract the value at `index` as `T`
    ///
    /// # Errors
    ///
    /// Returns `ValueExtractionError::MissingColumn` if the row is shorter than
    /// `index + 1`, otherwise whatever `T::try_get` reports.
    pub fn try_get<T: TryGetable>(&self, index: usize) -> Result<T, ValueExtractionError> {
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or(ValueExtractionError::MissingColumn(index))?;
        T::try_get(value)
    }

    /// Start a left-to-right cursor at column 0
    pub fn cursor(&self) -> RowCursor<'_> {
        RowCursor {
            row: self,
            position: 0,
        }
    }
}

/// Sequential reader over a `ValueRow`
#[derive(Debug)]
pub struct RowCursor<'r> {
    row: &'r ValueRow,
    position: usize,
}

impl<'r> RowCursor<'r> {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.row.len().saturating_sub(self.position)
    }

    /// Take the next value
    pub fn next_value(&mut self) -> Result<Value, ValueExtractionError> {
        let value = self
            .row
            .get(self.position)
            .cloned()
            .ok_or(ValueExtractionError::MissingColumn(self.position))?;
        self.position += 1;
        Ok(value)
    }

    /// Take the next value as `T`
    pub fn next_as<T: TryGetable>(&mut self) -> Result<T, ValueExtractionError> {
        T::try_get(self.next_value()?)
    }

    /// Skip `count` columns
    pub fn skip(&mut self, count: usize) {
        self.position += count;
    }

    /// Fill `record` from the columns under the cursor.
    ///
    /// The record consumes one value per field that carries a `db` column, in
    /// declaration order. A nested record field with a column feeds that value
    /// to the nested record's primary key when the nested record is allocated.
    /// Afterwards every allocated nested record consumes its own columns, again
    /// in declaration order. Unallocated `Option` records consume nothing, so
    /// the caller's factory decides which joined records the row carries.
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::ParseError` naming the record and field when a value
    /// is missing or cannot be extracted.
    pub fn scan_record(&mut self, record: &mut dyn Record) -> Result<(), ShelfError> {
        let meta = record.record_meta();

        for (index, field) in meta.fields.iter().enumerate() {
            if field.column().is_none() {
                continue;
            }
            let value = self
                .next_value()
                .map_err(|e| scan_error(meta.type_name, field.name, &e))?;
            record
                .scan_field(index, value)
                .map_err(|e| scan_error(meta.type_name, field.name, &e))?;
        }

        for (index, field) in meta.fields.iter().enumerate() {
            if !field.kind.is_record() {
                continue;
            }
            let nested = match record.field_mut(index) {
                Some(FieldMut::Record(nested)) => Some(nested),
                Some(FieldMut::OptionalRecord(slot)) => slot.get_mut(),
                _ => None,
            };
            if let Some(nested) = nested {
                self.scan_record(nested)?;
            }
        }

        Ok(())
    }
}

fn scan_error(type_name: &str, field: &str, err: &ValueExtractionError) -> ShelfError {
    ShelfError::ParseError(format!("{type_name}.{field}: {err}"))
}

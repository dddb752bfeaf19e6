//! Value conversion between `sea_query::Value` and the `postgres` driver.
//!
//! Parameters go out as boxed `ToSql` objects. A NULL keeps the Rust type of
//! its variant (`Value::Int(None)` is bound as `Option<i32>`), so the server
//! sees a typed NULL rather than an untyped one.
//!
//! Rows come back as [`ValueRow`]s, with every column converted according to
//! its PostgreSQL type name.

use crate::executor::ShelfError;
use crate::value::ValueRow;
use postgres::types::{ToSql, Type};
use postgres::Row;
use sea_query::Value;

/// A boxed statement parameter
pub type SqlParam = Box<dyn ToSql + Sync>;

/// Convert SeaQuery values to `postgres` parameters.
///
/// # Errors
///
/// Returns `ShelfError::Other` if an unsupported value type is encountered, or
/// if an unsigned value does not fit the signed PostgreSQL integer types.
pub fn to_sql_params(values: &[Value]) -> Result<Vec<SqlParam>, ShelfError> {
    values.iter().map(to_sql_param).collect()
}

fn to_sql_param(value: &Value) -> Result<SqlParam, ShelfError> {
    let param: SqlParam = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => {
            let converted = v
                .map(|u| {
                    i64::try_from(u).map_err(|_| {
                        ShelfError::Other(format!(
                            "BigUnsigned value {} exceeds i64::MAX ({}), cannot be safely cast to i64",
                            u,
                            i64::MAX
                        ))
                    })
                })
                .transpose()?;
            Box::new(converted)
        }
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.clone()),
        Value::Char(v) => Box::new(v.map(|c| c.to_string())),
        Value::Bytes(v) => Box::new(v.clone()),
        Value::Json(v) => Box::new(v.as_deref().cloned()),
        Value::ChronoDate(v) => Box::new(*v),
        Value::ChronoDateTime(v) => Box::new(*v),
        Value::ChronoDateTimeUtc(v) => Box::new(*v),
        other => {
            return Err(ShelfError::Other(format!(
                "Unsupported value type in query: {other:?}"
            )))
        }
    };
    Ok(param)
}

/// Convert a driver row into a [`ValueRow`].
///
/// # Errors
///
/// Returns `ShelfError::ParseError` for a column type without a mapping, or the
/// driver error when a column cannot be decoded.
pub fn row_to_value_row(row: &Row) -> Result<ValueRow, ShelfError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        values.push(column_value(row, index, column.type_(), column.name())?);
    }

    Ok(ValueRow::new(columns, values))
}

fn column_value(row: &Row, index: usize, ty: &Type, name: &str) -> Result<Value, ShelfError> {
    let value = match ty.name() {
        "bool" => Value::Bool(row.try_get(index)?),
        "int2" => Value::SmallInt(row.try_get(index)?),
        "int4" => Value::Int(row.try_get(index)?),
        "int8" => Value::BigInt(row.try_get(index)?),
        "float4" => Value::Float(row.try_get(index)?),
        "float8" => Value::Double(row.try_get(index)?),
        "text" | "varchar" | "bpchar" | "name" | "citext" => Value::String(row.try_get(index)?),
        "bytea" => Value::Bytes(row.try_get(index)?),
        "json" | "jsonb" => {
            let json: Option<serde_json::Value> = row.try_get(index)?;
            Value::Json(json.map(Box::new))
        }
        "date" => Value::ChronoDate(row.try_get(index)?),
        "timestamp" => Value::ChronoDateTime(row.try_get(index)?),
        "timestamptz" => Value::ChronoDateTimeUtc(row.try_get(index)?),
        other => {
            return Err(ShelfError::ParseError(format!(
                "unsupported column type {other} for column {name}"
            )))
        }
    };
    Ok(value)
}

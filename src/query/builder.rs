//! Dynamic statement builders
//!
//! Three builder types share the [`BuildStatement`] capability:
//!
//! - [`SelectBuilder`] - column list, joins, AND-combined conditions, ordering
//!   and paging
//! - [`InsertBuilder`] - column/value pairs derived from a record's metadata
//! - [`UpdateBuilder`] - `column = value` setters derived the same way, plus
//!   AND-combined conditions
//!
//! Builders write the neutral marker `?` while they accumulate; `build()`
//! renumbers every `?` of the final text to `$1..$n` from left to right, so the
//! numbering never depends on the order of builder calls. Raw expressions must
//! therefore not contain a literal `?` (e.g. the `jsonb ?` operator).
//!
//! Conditions only combine with `AND`. There is no `OR` or grouping support;
//! write such predicates with [`Condition::raw`].
//!
//! # Example
//!
//! ```rust
//! use shelfmap::query::{BuildStatement, Column, SelectBuilder, SortDirection};
//! use shelfmap::Record;
//!
//! #[derive(Default, Record)]
//! struct Book {
//!     #[record(db = "id", primary_key)]
//!     id: i64,
//!     #[record(db = "title")]
//!     title: String,
//! }
//!
//! let statement = SelectBuilder::from::<Book>()
//!     .columns_of::<Book>()
//!     .filter(Column::of::<Book>("title").eq("Dune"))
//!     .filter(Column::of::<Book>("id").gt(10i64))
//!     .order_by("books.id", SortDirection::Asc)
//!     .build();
//!
//! assert_eq!(
//!     statement.sql,
//!     "SELECT books.id, books.title FROM books WHERE books.title = $1 AND books.id > $2 ORDER BY books.id ASC"
//! );
//! assert_eq!(statement.values.len(), 2);
//! ```

use crate::executor::ShelfError;
use crate::model::Record;
use crate::query::statement::Statement;
use crate::value::ValueType;
use sea_query::Value;
use std::fmt;

/// Builder-internal placeholder, renumbered by `build()`
pub const MARKER: char = '?';

/// Emit the final statement
pub trait BuildStatement {
    fn build(&self) -> Statement;
}

/// A qualified column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Table name or alias; empty for an unqualified column
    pub table: String,
    pub name: String,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    /// An unqualified column
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// The `db` column of field `field` of `T`, qualified by `T`'s table
    ///
    /// # Panics
    ///
    /// Panics when `T` has no field named `field` or the field has no `db`
    /// column. Both are programming errors; use [`Column::try_of`] for names
    /// that come from outside the program.
    pub fn of<T: Record>(field: &str) -> Self {
        match Self::try_of::<T>(field) {
            Ok(column) => column,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible form of [`Column::of`]
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Other` when the field does not exist or carries no
    /// `db` column.
    pub fn try_of<T: Record>(field: &str) -> Result<Self, ShelfError> {
        let meta = T::meta();
        let field_meta = meta
            .field_index(field)
            .map(|i| &meta.fields[i])
            .ok_or_else(|| {
                ShelfError::Other(format!("{} has no field {}", meta.type_name, field))
            })?;
        let column = field_meta.column().ok_or_else(|| {
            ShelfError::Other(format!(
                "field {} of {} has no db column",
                field, meta.type_name
            ))
        })?;
        Ok(Self::new(meta.table, column))
    }

    /// Same column, qualified by `alias` instead
    #[must_use]
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.table = alias.into();
        self
    }

    /// `table.name`, or `name` when unqualified
    pub fn qualified(&self) -> String {
        self.to_string()
    }

    pub fn eq<V: ValueType>(&self, value: V) -> Condition {
        self.compare("=", value)
    }

    pub fn ne<V: ValueType>(&self, value: V) -> Condition {
        self.compare("<>", value)
    }

    pub fn gt<V: ValueType>(&self, value: V) -> Condition {
        self.compare(">", value)
    }

    pub fn gte<V: ValueType>(&self, value: V) -> Condition {
        self.compare(">=", value)
    }

    pub fn lt<V: ValueType>(&self, value: V) -> Condition {
        self.compare("<", value)
    }

    pub fn lte<V: ValueType>(&self, value: V) -> Condition {
        self.compare("<=", value)
    }

    pub fn is_null(&self) -> Condition {
        Condition::raw(format!("{self} IS NULL"), Vec::new())
    }

    pub fn is_not_null(&self) -> Condition {
        Condition::raw(format!("{self} IS NOT NULL"), Vec::new())
    }

    fn compare<V: ValueType>(&self, op: &str, value: V) -> Condition {
        Condition::raw(format!("{self} {op} {MARKER}"), vec![value.into_value()])
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.table, self.name)
        }
    }
}

/// A condition expression and the values for its `?` markers, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub expr: String,
    pub values: Vec<Value>,
}

impl Condition {
    /// A hand-written expression; `values` must match its `?` markers
    pub fn raw(expr: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            expr: expr.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `SELECT` statement builder
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    table: String,
    alias: Option<String>,
    columns: Vec<String>,
    joins: Vec<String>,
    conditions: Vec<Condition>,
    order: Vec<(String, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    /// Select from the table of `T`
    pub fn from<T: Record>() -> Self {
        Self::table(T::meta().table)
    }

    /// Select from an explicit table
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Alias the table; later `columns_of` calls qualify with the alias
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add every `db` column of `T`, qualified by this builder's alias or table
    #[must_use]
    pub fn columns_of<T: Record>(self) -> Self {
        let qualifier = self.qualifier().to_string();
        self.aliased_columns_of::<T>(&qualifier)
    }

    /// Add every `db` column of `T`, qualified by `alias`
    #[must_use]
    pub fn aliased_columns_of<T: Record>(mut self, alias: &str) -> Self {
        self.columns.extend(
            T::meta()
                .columns()
                .map(|(_, column)| format!("{alias}.{column}")),
        );
        self
    }

    /// Add column expressions verbatim
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn select_all(mut self) -> Self {
        self.columns.push("*".to_string());
        self
    }

    /// Append a join clause verbatim, e.g. `LEFT JOIN users u ON u.id = b.user_id`
    #[must_use]
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// AND another condition
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, expr: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push((expr.into(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl BuildStatement for SelectBuilder {
    fn build(&self) -> Statement {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", self.table);
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(alias);
        }
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        let mut values = Vec::new();
        push_where(&mut sql, &mut values, &self.conditions);

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(expr, direction)| format!("{expr} {direction}"))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {MARKER}"));
            values.push(Value::BigInt(Some(limit)));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {MARKER}"));
            values.push(Value::BigInt(Some(offset)));
        }

        Statement::new(renumber_markers(&sql), values)
    }
}

/// `INSERT` statement builder
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    returning: Vec<String>,
}

impl InsertBuilder {
    /// Columns and values of every writable field of `model`, in declaration order
    ///
    /// The primary key and `generated` fields are left to the store.
    pub fn from_model(model: &dyn Record) -> Self {
        let meta = model.record_meta();
        let (columns, values) = meta
            .writable_columns()
            .filter_map(|(index, column)| {
                model
                    .column_value(index)
                    .map(|value| (column.to_string(), value))
            })
            .unzip();

        Self {
            table: meta.table.to_string(),
            columns,
            values,
            returning: Vec::new(),
        }
    }

    /// Add a column the model does not carry, e.g. `created_by`
    #[must_use]
    pub fn value<V: ValueType>(mut self, column: impl Into<String>, value: V) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into_value());
        self
    }

    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }
}

impl BuildStatement for InsertBuilder {
    fn build(&self) -> Statement {
        let mut sql = if self.columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table)
        } else {
            let markers = vec![MARKER.to_string(); self.columns.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                self.columns.join(", "),
                markers
            )
        };
        push_returning(&mut sql, &self.returning);

        Statement::new(renumber_markers(&sql), self.values.clone())
    }
}

/// `UPDATE` statement builder
///
/// The builder does not require a condition. Callers must add at least an
/// identity condition or the statement updates the whole table.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    setters: Vec<String>,
    values: Vec<Value>,
    conditions: Vec<Condition>,
    returning: Vec<String>,
}

impl UpdateBuilder {
    /// `column = ?` setters for every writable field of `model`, in declaration order
    pub fn from_model(model: &dyn Record) -> Self {
        let meta = model.record_meta();
        let mut builder = Self::table(meta.table);
        for (index, column) in meta.writable_columns() {
            if let Some(value) = model.column_value(index) {
                builder.setters.push(format!("{column} = {MARKER}"));
                builder.values.push(value);
            }
        }
        builder
    }

    /// An update of `table` without setters
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            setters: Vec::new(),
            values: Vec::new(),
            conditions: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Add a `column = ?` setter
    #[must_use]
    pub fn set<V: ValueType>(mut self, column: &str, value: V) -> Self {
        self.setters.push(format!("{column} = {MARKER}"));
        self.values.push(value.into_value());
        self
    }

    /// Add a setter expression verbatim, e.g. `version = version + 1`
    #[must_use]
    pub fn set_raw(mut self, expr: impl Into<String>) -> Self {
        self.setters.push(expr.into());
        self
    }

    /// AND another condition
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }
}

impl BuildStatement for UpdateBuilder {
    fn build(&self) -> Statement {
        let mut sql = format!("UPDATE {} SET {}", self.table, self.setters.join(", "));
        let mut values = self.values.clone();
        push_where(&mut sql, &mut values, &self.conditions);
        push_returning(&mut sql, &self.returning);

        Statement::new(renumber_markers(&sql), values)
    }
}

fn push_where(sql: &mut String, values: &mut Vec<Value>, conditions: &[Condition]) {
    if conditions.is_empty() {
        return;
    }
    let exprs = conditions
        .iter()
        .map(|c| c.expr.as_str())
        .collect::<Vec<_>>()
        .join(" AND ");
    sql.push_str(" WHERE ");
    sql.push_str(&exprs);
    values.extend(conditions.iter().flat_map(|c| c.values.iter().cloned()));
}

fn push_returning(sql: &mut String, returning: &[String]) {
    if !returning.is_empty() {
        sql.push_str(" RETURNING ");
        sql.push_str(&returning.join(", "));
    }
}

/// Replace every `?` with `$1..$n`, left to right
///
/// Quoting is not tracked, so a `?` inside a string literal is numbered too.
/// Write `??` for a literal `?`, e.g. the `jsonb` key-exists operator.
pub fn renumber_markers(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != MARKER {
            out.push(ch);
        } else if chars.next_if_eq(&MARKER).is_some() {
            out.push(MARKER);
        } else {
            index += 1;
            out.push('$');
            out.push_str(&index.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmap_derive::Record;

    #[derive(Debug, Clone, Default, Record)]
    struct User {
        #[record(db = "id", primary_key)]
        id: i64,
        #[record(db = "name")]
        name: String,
    }

    #[derive(Debug, Clone, Default, Record)]
    struct Book {
        #[record(db = "id", primary_key)]
        id: i64,
        #[record(db = "title")]
        title: String,
        #[record(db = "pages")]
        pages: i32,
        #[record(db = "version", generated)]
        version: i32,
        #[record(db = "user_id", nested)]
        user: Option<User>,
        note: String,
    }

    fn book() -> Book {
        Book {
            id: 4,
            title: "Dune".to_string(),
            pages: 412,
            version: 3,
            user: Some(User {
                id: 7,
                name: "Ada".to_string(),
            }),
            note: "unsaved".to_string(),
        }
    }

    #[test]
    fn test_renumber_markers() {
        assert_eq!(renumber_markers("a = ? AND b = ? OR c = ?"), "a = $1 AND b = $2 OR c = $3");
        assert_eq!(renumber_markers("no markers"), "no markers");
    }

    #[test]
    fn test_renumber_markers_inside_literals_and_escapes() {
        assert_eq!(renumber_markers("title = 'why?' AND id = ?"), "title = 'why$1' AND id = $2");
        assert_eq!(renumber_markers("tags ?? ? AND id = ?"), "tags ? $1 AND id = $2");

        let statement = SelectBuilder::from::<Book>()
            .select_all()
            .filter(Condition::raw("meta ?? 'isbn'", vec![]))
            .filter(Column::bare("id").eq(4i64))
            .build();
        assert_eq!(statement.sql, "SELECT * FROM books WHERE meta ? 'isbn' AND id = $1");
    }

    #[test]
    fn test_column_of_uses_db_tag() {
        let column = Column::of::<Book>("user");
        assert_eq!(column.qualified(), "books.user_id");
        assert_eq!(column.aliased("b").qualified(), "b.user_id");
        assert_eq!(Column::bare("id").qualified(), "id");
    }

    #[test]
    fn test_try_of_errors() {
        assert!(Column::try_of::<Book>("missing").is_err());
        assert!(Column::try_of::<Book>("note").is_err());
    }

    #[test]
    #[should_panic(expected = "has no field")]
    fn test_of_panics_on_unknown_field() {
        let _ = Column::of::<Book>("isbn");
    }

    #[test]
    fn test_conditions() {
        let column = Column::new("b", "pages");
        let condition = column.gte(100i32);
        assert_eq!(condition.expr, "b.pages >= ?");
        assert_eq!(condition.values, vec![Value::Int(Some(100))]);
        assert_eq!(column.is_null().expr, "b.pages IS NULL");
        assert!(column.is_not_null().values.is_empty());
        assert_eq!(column.ne(1i32).expr, "b.pages <> ?");
        assert_eq!(column.lt(1i32).expr, "b.pages < ?");
        assert_eq!(column.lte(1i32).expr, "b.pages <= ?");
    }

    #[test]
    fn test_select_with_alias_join_and_paging() {
        let statement = SelectBuilder::from::<Book>()
            .alias("b")
            .columns(["count(*) OVER()"])
            .columns_of::<Book>()
            .aliased_columns_of::<User>("u")
            .join("LEFT JOIN users u ON u.id = b.user_id")
            .filter(Column::of::<Book>("user").aliased("b").eq(7i64))
            .filter(Condition::raw("b.deleted = false", vec![]))
            .order_by("b.title", SortDirection::Desc)
            .order_by("b.id", SortDirection::Asc)
            .limit(20)
            .offset(40)
            .build();

        assert_eq!(
            statement.sql,
            "SELECT count(*) OVER(), b.id, b.title, b.pages, b.version, b.user_id, u.id, u.name \
             FROM books b LEFT JOIN users u ON u.id = b.user_id \
             WHERE b.user_id = $1 AND b.deleted = false \
             ORDER BY b.title DESC, b.id ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            statement.values,
            vec![
                Value::BigInt(Some(7)),
                Value::BigInt(Some(20)),
                Value::BigInt(Some(40))
            ]
        );
    }

    #[test]
    fn test_select_all_without_conditions() {
        let statement = SelectBuilder::table("users").select_all().build();
        assert_eq!(statement.sql, "SELECT * FROM users");
        assert!(statement.values.is_empty());
    }

    #[test]
    fn test_insert_from_model() {
        let statement = InsertBuilder::from_model(&book())
            .value("created_by", 7i64)
            .returning(["id", "created_at", "version"])
            .build();
        assert_eq!(
            statement.sql,
            "INSERT INTO books (title, pages, user_id, created_by) VALUES ($1, $2, $3, $4) \
             RETURNING id, created_at, version"
        );
        assert_eq!(
            statement.values,
            vec![
                Value::String(Some("Dune".to_string())),
                Value::Int(Some(412)),
                Value::BigInt(Some(7)),
                Value::BigInt(Some(7)),
            ]
        );
    }

    #[test]
    fn test_insert_binds_typed_null_for_missing_reference() {
        let mut model = book();
        model.user = None;
        let statement = InsertBuilder::from_model(&model).build();
        assert_eq!(statement.values[2], Value::BigInt(None));
    }

    #[test]
    fn test_insert_without_writable_columns_uses_defaults() {
        #[derive(Debug, Clone, Default, Record)]
        #[record(table = "audit_marks")]
        struct AuditMark {
            #[record(db = "id", primary_key)]
            id: i64,
            #[record(db = "created_at", generated)]
            created_at: Option<chrono::DateTime<chrono::Utc>>,
        }

        let statement = InsertBuilder::from_model(&AuditMark::default())
            .returning(["id", "created_at"])
            .build();
        assert_eq!(
            statement.sql,
            "INSERT INTO audit_marks DEFAULT VALUES RETURNING id, created_at"
        );
        assert!(statement.values.is_empty());
    }

    #[test]
    fn test_update_numbers_setters_before_conditions() {
        // conditions are added before the extra setter, numbering still follows the text
        let statement = UpdateBuilder::from_model(&book())
            .filter(Column::bare("id").eq(4i64))
            .filter(Column::bare("version").eq(3i32))
            .set_raw("version = version + 1")
            .set("updated_by", 7i64)
            .returning(["version"])
            .build();
        assert_eq!(
            statement.sql,
            "UPDATE books SET title = $1, pages = $2, user_id = $3, version = version + 1, \
             updated_by = $4 WHERE id = $5 AND version = $6 RETURNING version"
        );
        assert_eq!(statement.values.len(), 6);
        assert_eq!(statement.values[3], Value::BigInt(Some(7)));
        assert_eq!(statement.values[4], Value::BigInt(Some(4)));
        assert_eq!(statement.values[5], Value::Int(Some(3)));
    }
}

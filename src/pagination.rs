//! Paged reads
//!
//! A paged statement selects a window count as its first column
//! (`count(*) OVER()`) followed by the record columns, so one round trip yields
//! both the page and the total. [`paginated_query`] scans every row into a
//! record built by a caller-supplied factory, which decides which nested
//! records the row carries, and derives [`Metadata`] from the total.

use crate::executor::{ShelfError, ShelfExecutor, StatementExt};
use crate::model::Record;
use crate::query::{log_statement, SortDirection, Statement};
use crate::validation::{permitted_value, ValidationErrors, Validator};
use serde::{Deserialize, Serialize};

/// Highest page number a client may request
pub const MAX_PAGE: i64 = 10_000_000;

/// Paging and sorting input
///
/// `sort` names a column, with a leading `-` for descending order. It is only
/// usable when listed in `sort_safelist`, which the caller fills in; it is
/// never read from the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(skip)]
    pub sort_safelist: Vec<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

fn default_sort() -> String {
    "id".to_string()
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            sort: default_sort(),
            sort_safelist: Vec::new(),
        }
    }
}

impl Filters {
    pub fn new(page: i64, page_size: i64, sort: impl Into<String>) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist: Vec::new(),
        }
    }

    /// Replace the sort safelist
    #[must_use]
    pub fn with_safelist<I, S>(mut self, safelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_safelist = safelist.into_iter().map(Into::into).collect();
        self
    }

    /// Column named by `sort`, without the direction prefix
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Validation` on the `sort` field when the value is
    /// not in the safelist; the value must never reach the SQL text.
    pub fn sort_column(&self) -> Result<&str, ShelfError> {
        if self.sort_safelist.iter().any(|safe| *safe == self.sort) {
            Ok(self.sort.trim_start_matches('-'))
        } else {
            Err(ValidationErrors::single("sort", "invalid sort value").into())
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip; saturates for filters that never went through
    /// [`validate_filters`]
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.page_size)
    }
}

/// Record paging errors on `validator`
///
/// # Example
///
/// ```rust
/// use shelfmap::pagination::{validate_filters, Filters};
/// use shelfmap::Validator;
///
/// let filters = Filters::new(0, 500, "-pages").with_safelist(["id", "title"]);
/// let mut v = Validator::new();
/// validate_filters(&mut v, &filters, 100);
///
/// assert_eq!(v.errors().get("page"), Some("must be greater than zero"));
/// assert_eq!(v.errors().get("page_size"), Some("must be a maximum of 100"));
/// assert_eq!(v.errors().get("sort"), Some("invalid sort value"));
/// ```
pub fn validate_filters(v: &mut Validator, filters: &Filters, max_page_size: i64) {
    v.check(filters.page > 0, "page", "must be greater than zero");
    v.check(
        filters.page <= MAX_PAGE,
        "page",
        "must be a maximum of 10 million",
    );
    v.check(filters.page_size > 0, "page_size", "must be greater than zero");
    v.check(
        filters.page_size <= max_page_size,
        "page_size",
        &format!("must be a maximum of {max_page_size}"),
    );

    let safelist: Vec<&str> = filters.sort_safelist.iter().map(String::as_str).collect();
    v.check(
        permitted_value(filters.sort.as_str(), &safelist),
        "sort",
        "invalid sort value",
    );
}

/// Paging summary returned next to a page of records
///
/// All zero when the query matched nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Metadata for `total_records` rows split into pages of `page_size`
///
/// ```rust
/// use shelfmap::pagination::calculate_metadata;
///
/// let metadata = calculate_metadata(45, 1, 20);
/// assert_eq!(metadata.last_page, 3);
/// assert!(calculate_metadata(0, 1, 20).is_empty());
/// ```
pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records <= 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

/// Run a paged statement and scan every row
///
/// The first column of every row must be the window count; the remaining
/// columns are scanned into `factory()` by [`RowCursor::scan_record`].
///
/// Zero rows give an empty page and empty metadata. A row that fails to scan
/// fails the whole call; no partial page is returned.
///
/// # Errors
///
/// Returns the executor's error, or `ShelfError::ParseError` for a row that
/// does not match the record layout.
///
/// [`RowCursor::scan_record`]: crate::value::RowCursor::scan_record
pub fn paginated_query<E, T, F>(
    executor: &E,
    statement: &Statement,
    filters: &Filters,
    mut factory: F,
) -> Result<(Vec<T>, Metadata), ShelfError>
where
    E: ShelfExecutor + ?Sized,
    T: Record,
    F: FnMut() -> T,
{
    log_statement(statement);
    let rows = executor.query_statement(statement)?;

    let mut total_records = 0;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut cursor = row.cursor();
        total_records = cursor.next_as::<i64>()?;
        let mut record = factory();
        cursor.scan_record(&mut record)?;
        records.push(record);
    }

    let metadata = calculate_metadata(total_records, filters.page, filters.page_size);
    Ok((records, metadata))
}

/// Run a by-identity lookup and scan its first row into `factory()`
///
/// # Errors
///
/// Returns `ShelfError::NotFound` when no row matches, the executor's error,
/// or `ShelfError::ParseError` for a row that does not match the record layout.
pub fn get_by_query<E, T, F>(executor: &E, statement: &Statement, factory: F) -> Result<T, ShelfError>
where
    E: ShelfExecutor + ?Sized,
    T: Record,
    F: FnOnce() -> T,
{
    log_statement(statement);
    let row = executor
        .query_opt(&statement.sql, &statement.values)?
        .ok_or(ShelfError::NotFound)?;

    let mut record = factory();
    row.cursor().scan_record(&mut record)?;
    Ok(record)
}

//! Book persistence over named-parameter templates

use crate::bookshelf::models::{Book, User};
use crate::executor::{ShelfError, ShelfExecutor};
use crate::model::select_columns;
use crate::pagination::{get_by_query, paginated_query, Filters, Metadata};
use crate::query::{named_query, Statement};
use crate::transaction::Transaction;
use crate::writer::{ConstraintMap, Versioned, VersionedWriter};

/// Sort values a book listing accepts
pub const BOOK_SORT_SAFELIST: [&str; 8] = [
    "id", "title", "author", "pages", "-id", "-title", "-author", "-pages",
];

/// Constraint errors raised by the `books` table
pub fn book_constraints() -> ConstraintMap {
    ConstraintMap::new()
        .with(
            "unique_title_per_user",
            "title",
            "book with this title already exists for this user",
        )
        .with(
            "chk_books_pages_positive",
            "pages",
            "pages must be a positive number",
        )
}

/// Paged full-text listing of a user's books, each with its owner loaded
///
/// An empty `title` or `author` disables that filter.
///
/// # Errors
///
/// Returns `ShelfError::Validation` when `filters.sort` is not in the
/// safelist.
pub fn list_statement(
    title: &str,
    author: &str,
    user_id: i64,
    filters: &Filters,
) -> Result<Statement, ShelfError> {
    let sort_column = filters.sort_column()?;
    let columns = [select_columns::<Book>("b"), select_columns::<User>("u")].join(", ");
    let template = format!(
        "
        SELECT
            count(*) OVER(),
            {columns}
        FROM books b
        LEFT JOIN users u ON u.id = b.user_id
        WHERE
            (to_tsvector('simple', b.title) @@ plainto_tsquery('simple', :title) OR :title = '')
            AND (to_tsvector('simple', b.author) @@ plainto_tsquery('simple', :author) OR :author = '')
            AND b.deleted = false
            AND b.user_id = :userID
        ORDER BY
            b.{sort_column} {direction},
            b.id ASC
        LIMIT :limit
        OFFSET :offset
        ",
        direction = filters.sort_direction(),
    );

    named_query(
        &template,
        &named_params! {
            "title" => title,
            "author" => author,
            "userID" => user_id,
            "limit" => filters.limit(),
            "offset" => filters.offset(),
        },
    )
}

#[derive(Debug, Clone)]
pub struct BookRepository {
    writer: VersionedWriter,
}

impl Default for BookRepository {
    fn default() -> Self {
        Self::new(VersionedWriter::default())
    }
}

impl BookRepository {
    /// Repository writing through `writer`, with the book constraints added
    pub fn new(writer: VersionedWriter) -> Self {
        Self {
            writer: writer.with_constraints(book_constraints()),
        }
    }

    pub fn writer(&self) -> &VersionedWriter {
        &self.writer
    }

    /// # Errors
    ///
    /// As [`list_statement`] and [`paginated_query`].
    pub fn get_all<E: ShelfExecutor + ?Sized>(
        &self,
        executor: &E,
        title: &str,
        author: &str,
        user_id: i64,
        filters: &Filters,
    ) -> Result<(Vec<Book>, Metadata), ShelfError> {
        let statement = list_statement(title, author, user_id, filters)?;
        paginated_query(executor, &statement, filters, || Book {
            user: Some(User::default()),
            ..Book::default()
        })
    }

    /// # Errors
    ///
    /// Returns `ShelfError::NotFound` when the user owns no live book `book_id`.
    pub fn get_by_id<E: ShelfExecutor + ?Sized>(
        &self,
        executor: &E,
        book_id: i64,
        user_id: i64,
    ) -> Result<Book, ShelfError> {
        let template = format!(
            "
            SELECT {columns}
            FROM books b
            LEFT JOIN users u ON u.id = b.user_id
            WHERE b.id = :id AND b.user_id = :userID AND b.deleted = false
            ",
            columns = [select_columns::<Book>("b"), select_columns::<User>("u")].join(", "),
        );
        let statement = named_query(
            &template,
            &named_params! {
                "id" => book_id,
                "userID" => user_id,
            },
        )?;
        get_by_query(executor, &statement, || Book {
            user: Some(User::default()),
            ..Book::default()
        })
    }

    /// Insert `book` owned by its `user`, storing the assigned id, creation
    /// time and version back into it
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Validation` on the `title` or `pages` field for
    /// the known constraints, otherwise as [`VersionedWriter::insert`].
    pub fn insert<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        book: &mut Book,
    ) -> Result<(), ShelfError> {
        let user_id = book.user.as_ref().map_or(0, |u| u.id);
        let statement = named_query(
            "
            INSERT INTO books (title, author, pages, description, user_id, created_by)
            VALUES (:title, :author, :pages, :description, :user_id, :user_id)
            RETURNING id, created_at, version
            ",
            &named_params! {
                "title" => book.title.as_str(),
                "author" => book.author.as_str(),
                "pages" => book.pages,
                "description" => book.description.as_str(),
                "user_id" => user_id,
            },
        )?;

        let inserted = self.writer.insert(tx, &statement)?;
        book.apply_inserted(&inserted)
    }

    /// Versioned update of a book owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::EditConflict` when the version is stale or the book
    /// is gone or owned by someone else; `book.version` is then unchanged.
    pub fn update<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        book: &mut Book,
        user_id: i64,
    ) -> Result<(), ShelfError> {
        let statement = named_query(
            "
            UPDATE books SET
                title = :title,
                author = :author,
                pages = :pages,
                description = :description,
                updated_at = now(),
                updated_by = :user_id,
                version = version + 1
            WHERE
                id = :id
                AND version = :version
                AND deleted = false
                AND user_id = :user_id
            RETURNING version
            ",
            &named_params! {
                "id" => book.id,
                "title" => book.title.as_str(),
                "author" => book.author.as_str(),
                "pages" => book.pages,
                "description" => book.description.as_str(),
                "user_id" => user_id,
                "version" => book.version,
            },
        )?;

        book.version = self.writer.update(tx, &statement)?;
        Ok(())
    }

    /// Soft-delete a book owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::NotFound` when no live book matched.
    pub fn delete<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        book_id: i64,
        user_id: i64,
    ) -> Result<(), ShelfError> {
        let statement = named_query(
            "
            UPDATE books SET
                deleted = true,
                updated_at = now(),
                updated_by = :user_id
            WHERE
                id = :id
                AND user_id = :user_id
                AND deleted = false
            ",
            &named_params! {
                "id" => book_id,
                "user_id" => user_id,
            },
        )?;
        self.writer.soft_delete(tx, &statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::MAX_PAGE;
    use sea_query::Value;

    fn filters(sort: &str) -> Filters {
        Filters::new(1, 20, sort).with_safelist(BOOK_SORT_SAFELIST)
    }

    #[test]
    fn test_list_statement_duplicates_title_and_author() {
        let statement = list_statement("Dune", "", 7, &filters("id")).unwrap();
        let sql = statement.minified();

        assert!(sql.contains("plainto_tsquery('simple', $1) OR $2 = ''"));
        assert!(sql.contains("plainto_tsquery('simple', $3) OR $4 = ''"));
        assert!(sql.contains("b.user_id = $5"));
        assert!(sql.ends_with("LIMIT $6 OFFSET $7"));
        assert_eq!(
            statement.values,
            vec![
                Value::String(Some("Dune".to_string())),
                Value::String(Some("Dune".to_string())),
                Value::String(Some(String::new())),
                Value::String(Some(String::new())),
                Value::BigInt(Some(7)),
                Value::BigInt(Some(20)),
                Value::BigInt(Some(0)),
            ]
        );
    }

    #[test]
    fn test_list_statement_selects_book_then_user() {
        let statement = list_statement("", "", 7, &filters("-title")).unwrap();
        let sql = statement.minified();
        assert!(sql.starts_with(
            "SELECT count(*) OVER(), b.id, b.title, b.author, b.pages, b.description, \
             b.created_at, b.version, b.user_id, u.id, u.name, u.email FROM books b"
        ));
        assert!(sql.contains("ORDER BY b.title DESC, b.id ASC"));
    }

    #[test]
    fn test_list_statement_rejects_unsafe_sort() {
        let err = list_statement("", "", 7, &filters("title desc; --")).unwrap_err();
        assert_eq!(
            err.validation_errors().and_then(|e| e.get("sort")),
            Some("invalid sort value")
        );
    }

    #[test]
    fn test_list_statement_offset_follows_page() {
        let f = Filters::new(3, 10, "id").with_safelist(BOOK_SORT_SAFELIST);
        let statement = list_statement("", "", 1, &f).unwrap();
        assert_eq!(statement.values.last(), Some(&Value::BigInt(Some(20))));
        assert!(f.page < MAX_PAGE);
    }

    #[test]
    fn test_constraints() {
        let constraints = book_constraints();
        assert_eq!(
            constraints.get("unique_title_per_user"),
            Some(("title", "book with this title already exists for this user"))
        );
        assert_eq!(
            constraints.get("chk_books_pages_positive"),
            Some(("pages", "pages must be a positive number"))
        );
        assert!(BookRepository::default()
            .writer()
            .constraints()
            .get("unique_title_per_user")
            .is_some());
    }
}

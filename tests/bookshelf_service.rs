//! Book and reading-plan services against a scripted executor

mod common;

use chrono::Duration;
use common::*;
use sea_query::Value;
use shelfmap::bookshelf::{
    Book, BookService, PlanCriteria, ReadingPlan, ReadingPlanService, ReadingPriority,
    ReadingStatus, User,
};
use shelfmap::pagination::Filters;
use shelfmap::{ShelfConfig, ShelfError};

fn new_book() -> Book {
    Book {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        pages: 412,
        description: "Desert planet".to_string(),
        ..Book::default()
    }
}

#[test]
fn test_find_all_scans_books_with_owner() {
    let executor = MockExecutor::new();
    executor.rows(vec![
        book_listing_row(45, 1, "Dune", 7, "Ada"),
        book_listing_row(45, 2, "Dune Messiah", 7, "Ada"),
    ]);
    let service = BookService::new(&executor, &ShelfConfig::default());

    let (books, metadata) = service
        .find_all("dune", "", 7, &Filters::new(1, 20, "-title"))
        .unwrap();

    assert_eq!(books.len(), 2);
    assert_eq!(books[1].title, "Dune Messiah");
    assert_eq!(books[0].version, 1);
    let owner = books[0].user.as_ref().unwrap();
    assert_eq!(owner.id, 7);
    assert_eq!(owner.name, "Ada");
    assert_eq!(owner.email, "ada@example.com");

    assert_eq!(metadata.total_records, 45);
    assert_eq!(metadata.last_page, 3);
    assert_eq!(metadata.current_page, 1);

    let (sql, values) = &executor.data_statements()[0];
    assert!(sql.contains("ORDER BY"));
    assert_eq!(values.len(), 7);
    assert!(executor.control_statements().is_empty());
}

#[test]
fn test_find_all_empty_page() {
    let executor = MockExecutor::new();
    executor.rows(Vec::new());
    let service = BookService::new(&executor, &ShelfConfig::default());

    let (books, metadata) = service
        .find_all("", "", 7, &Filters::default())
        .unwrap();
    assert!(books.is_empty());
    assert!(metadata.is_empty());
    assert_eq!(metadata.last_page, 0);
}

#[test]
fn test_find_all_rejects_bad_paging_before_querying() {
    let executor = MockExecutor::new();
    let service = BookService::new(&executor, &ShelfConfig::default());

    let err = service
        .find_all("", "", 7, &Filters::new(1, 1000, "; DROP TABLE books"))
        .unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.get("page_size"), Some("must be a maximum of 100"));
    assert_eq!(errors.get("sort"), Some("invalid sort value"));
    assert!(executor.statements().is_empty());
}

#[test]
fn test_find_by_id_not_found() {
    let executor = MockExecutor::new();
    executor.rows(Vec::new());
    let service = BookService::new(&executor, &ShelfConfig::default());

    let err = service.find_by_id(99, 7).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_find_by_id_loads_owner() {
    let executor = MockExecutor::new();
    let mut row = book_columns(3, "Dune", "Frank Herbert", 412, 7);
    row.extend(user_columns(7, "Ada"));
    executor.rows(vec![row]);
    let service = BookService::new(&executor, &ShelfConfig::default());

    let book = service.find_by_id(3, 7).unwrap();
    assert_eq!(book.id, 3);
    assert_eq!(book.user.map(|u| u.name), Some("Ada".to_string()));
    assert_eq!(executor.data_statements()[0].1, vec![big(3), big(7)]);
}

#[test]
fn test_save_assigns_identity_in_a_transaction() {
    let executor = MockExecutor::new();
    executor.rows(vec![inserted_row(42, 1)]);
    let service = BookService::new(&executor, &ShelfConfig::default());

    let mut book = new_book();
    service.save(&mut book, 7).unwrap();

    assert_eq!(book.id, 42);
    assert_eq!(book.version, 1);
    assert_eq!(book.created_at, Some(timestamp()));
    assert_eq!(book.user, Some(User::with_id(7)));

    assert_eq!(
        executor.control_statements(),
        ["BEGIN", "SET LOCAL statement_timeout = 3000", "COMMIT"]
    );
    let (sql, values) = &executor.data_statements()[0];
    assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6)"));
    assert_eq!(values[4], big(7));
    assert_eq!(values[5], big(7));
}

#[test]
fn test_save_invalid_book_runs_nothing() {
    let executor = MockExecutor::new();
    let service = BookService::new(&executor, &ShelfConfig::default());

    let mut book = Book {
        title: String::new(),
        ..new_book()
    };
    let err = service.save(&mut book, 7).unwrap_err();
    assert_eq!(
        err.validation_errors().and_then(|e| e.get("title")),
        Some("must be provided")
    );
    assert!(executor.statements().is_empty());
}

#[test]
fn test_save_duplicate_title_is_a_field_error() {
    let executor = MockExecutor::new();
    executor.reply(Reply::Error(ShelfError::ConstraintViolation {
        constraint: "unique_title_per_user".to_string(),
        message: "duplicate key value violates unique constraint".to_string(),
    }));
    let service = BookService::new(&executor, &ShelfConfig::default());

    let mut book = new_book();
    let err = service.save(&mut book, 7).unwrap_err();
    assert_eq!(
        err.validation_errors().and_then(|e| e.get("title")),
        Some("book with this title already exists for this user")
    );
    assert_eq!(book.id, 0);
    assert_eq!(executor.control_statements().last().map(String::as_str), Some("ROLLBACK"));
}

#[test]
fn test_update_bumps_version() {
    let executor = MockExecutor::new();
    executor.rows(vec![vec![int(3)]]);
    let service = BookService::new(&executor, &ShelfConfig::default());

    let mut book = Book {
        id: 5,
        version: 2,
        ..new_book()
    };
    service.update(&mut book, 7).unwrap();
    assert_eq!(book.version, 3);

    let (sql, values) = &executor.data_statements()[0];
    assert!(sql.contains("version = version + 1"));
    assert!(sql.contains("RETURNING version"));
    assert!(values.contains(&int(2)));
}

#[test]
fn test_update_with_stale_version_conflicts() {
    let executor = MockExecutor::new();
    executor.rows(Vec::new());
    let service = BookService::new(&executor, &ShelfConfig::default());

    let mut book = Book {
        id: 5,
        version: 1,
        ..new_book()
    };
    let err = service.update(&mut book, 7).unwrap_err();
    assert!(err.is_edit_conflict());
    assert_eq!(book.version, 1);
    assert_eq!(executor.control_statements().last().map(String::as_str), Some("ROLLBACK"));
}

#[test]
fn test_update_timeout() {
    let executor = MockExecutor::new();
    executor.reply(Reply::Error(ShelfError::Timeout));
    let service = BookService::new(&executor, &ShelfConfig::default());

    let mut book = Book {
        id: 5,
        version: 1,
        ..new_book()
    };
    assert!(service.update(&mut book, 7).unwrap_err().is_timeout());
}

#[test]
fn test_delete_is_soft() {
    let executor = MockExecutor::new();
    executor.reply(Reply::Affected(1));
    let service = BookService::new(&executor, &ShelfConfig::default());

    service.delete(5, 7).unwrap();
    let (sql, values) = &executor.data_statements()[0];
    assert!(sql.contains("deleted = true"));
    assert!(sql.contains("AND deleted = false"));
    assert_eq!(values, &vec![big(7), big(5), big(7)]);
}

#[test]
fn test_delete_missing_book() {
    let executor = MockExecutor::new();
    executor.reply(Reply::Affected(0));
    let service = BookService::new(&executor, &ShelfConfig::default());

    assert!(service.delete(5, 7).unwrap_err().is_not_found());
}

fn new_plan() -> ReadingPlan {
    let start = timestamp();
    ReadingPlan {
        status: Some(ReadingStatus::Planned),
        priority: Some(ReadingPriority::High),
        start_date: Some(start),
        target_date: Some(start + Duration::days(30)),
        pages_per_day: 15,
        book: Some(Book {
            id: 3,
            ..Book::default()
        }),
        ..ReadingPlan::default()
    }
}

#[test]
fn test_plan_save_builds_insert_from_metadata() {
    let executor = MockExecutor::new();
    executor.rows(vec![inserted_row(11, 1)]);
    let service = ReadingPlanService::new(&executor, &ShelfConfig::default());

    let mut plan = new_plan();
    service.save(&mut plan, 7).unwrap();
    assert_eq!(plan.id, 11);
    assert_eq!(plan.version, 1);

    let (sql, values) = &executor.data_statements()[0];
    assert_eq!(
        sql,
        "INSERT INTO reading_plans (status, start_date, target_date, priority, pages_per_day, \
         minutes_per_day, book_id, user_id, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id, created_at, version"
    );
    assert_eq!(values[0], int(1));
    assert_eq!(values[3], int(3));
    assert_eq!(values[6], big(3));
    assert_eq!(values[7], big(7));
    assert_eq!(values[8], big(7));
}

#[test]
fn test_plan_save_requires_a_book() {
    let executor = MockExecutor::new();
    let service = ReadingPlanService::new(&executor, &ShelfConfig::default());

    let mut plan = ReadingPlan {
        book: None,
        ..new_plan()
    };
    let err = service.save(&mut plan, 7).unwrap_err();
    assert_eq!(
        err.validation_errors().and_then(|e| e.get("book")),
        Some("must be provided")
    );
    assert!(executor.statements().is_empty());
}

#[test]
fn test_plan_update_is_owned_and_versioned() {
    let executor = MockExecutor::new();
    executor.rows(vec![vec![int(4)]]);
    let service = ReadingPlanService::new(&executor, &ShelfConfig::default());

    let mut plan = ReadingPlan {
        id: 11,
        version: 3,
        user: Some(User::with_id(7)),
        ..new_plan()
    };
    service.update(&mut plan, 7).unwrap();
    assert_eq!(plan.version, 4);

    let (sql, values) = &executor.data_statements()[0];
    assert!(sql.starts_with("UPDATE reading_plans SET status = $1,"));
    assert!(sql.contains("updated_by = $9, version = version + 1, updated_at = now()"));
    assert!(sql.ends_with(
        "WHERE id = $10 AND version = $11 AND deleted = false AND user_id = $12 RETURNING version"
    ));
    assert_eq!(values.len(), 12);
    assert_eq!(values[9], big(11));
    assert_eq!(values[10], int(3));
    assert_eq!(values[11], big(7));
}

#[test]
fn test_plan_listing_loads_book_and_user() {
    let executor = MockExecutor::new();
    let mut row = vec![
        big(1),
        big(11),
        int(2),
        Value::ChronoDateTimeUtc(None),
        Value::ChronoDateTimeUtc(None),
        int(1),
        int(0),
        int(45),
        at(timestamp()),
        int(2),
        big(3),
        big(7),
    ];
    row.extend(book_columns(3, "Dune", "Frank Herbert", 412, 7));
    row.extend(user_columns(7, "Ada"));
    executor.rows(vec![row]);
    let service = ReadingPlanService::new(&executor, &ShelfConfig::default());

    let criteria = PlanCriteria {
        status: Some(ReadingStatus::Reading),
        user_id: 7,
        book_id: 3,
        ..PlanCriteria::default()
    };
    let (plans, metadata) = service
        .find_all(&criteria, &Filters::new(1, 20, "-target_date"))
        .unwrap();

    assert_eq!(metadata.total_records, 1);
    let plan = &plans[0];
    assert_eq!(plan.status, Some(ReadingStatus::Reading));
    assert_eq!(plan.priority, Some(ReadingPriority::Low));
    assert_eq!(plan.start_date, None);
    assert_eq!(plan.minutes_per_day, 45);
    let book = plan.book.as_ref().unwrap();
    assert_eq!(book.title, "Dune");
    assert_eq!(book.user, None);
    assert_eq!(plan.user.as_ref().map(|u| u.name.as_str()), Some("Ada"));
}

#[test]
fn test_plan_listing_rejects_unknown_status_code() {
    let executor = MockExecutor::new();
    let mut row = vec![big(1), big(11), int(9)];
    row.extend(vec![Value::ChronoDateTimeUtc(None); 2]);
    executor.rows(vec![row]);
    let service = ReadingPlanService::new(&executor, &ShelfConfig::default());

    let criteria = PlanCriteria {
        user_id: 7,
        book_id: 3,
        ..PlanCriteria::default()
    };
    let err = service
        .find_all(&criteria, &Filters::default())
        .unwrap_err();
    assert!(matches!(err, ShelfError::ParseError(ref msg) if msg.contains("ReadingPlan.status")));
}

#[test]
fn test_plan_delete() {
    let executor = MockExecutor::new();
    executor.reply(Reply::Affected(1));
    let service = ReadingPlanService::new(&executor, &ShelfConfig::default());

    service.delete(11, 7).unwrap();
    let (sql, values) = &executor.data_statements()[0];
    assert_eq!(
        sql,
        "UPDATE reading_plans SET deleted = true, updated_at = now(), updated_by = $1 \
         WHERE id = $2 AND user_id = $3 AND deleted = false"
    );
    assert_eq!(values, &vec![big(7), big(11), big(7)]);
}

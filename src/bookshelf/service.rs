//! Validating services over the repositories
//!
//! Each write validates its input first, then runs in its own transaction on
//! the service's executor. Reads run directly on the executor.

use crate::bookshelf::book_repository::{BookRepository, BOOK_SORT_SAFELIST};
use crate::bookshelf::models::{Book, ReadingPlan, User};
use crate::bookshelf::reading_plan_repository::{
    PlanCriteria, ReadingPlanRepository, PLAN_SORT_SAFELIST,
};
use crate::config::ShelfConfig;
use crate::executor::{ShelfError, ShelfExecutor};
use crate::pagination::{validate_filters, Filters, Metadata};
use crate::transaction::run_in_transaction;
use crate::validation::Validator;
use crate::writer::VersionedWriter;

/// Validate paging input against `safelist`, which replaces any caller list
fn checked_filters(
    filters: &Filters,
    safelist: &[&str],
    max_page_size: i64,
) -> Result<Filters, ShelfError> {
    let filters = filters.clone().with_safelist(safelist.iter().copied());
    let mut v = Validator::new();
    validate_filters(&mut v, &filters, max_page_size);
    v.into_result()?;
    Ok(filters)
}

pub struct BookService<E: ShelfExecutor> {
    executor: E,
    books: BookRepository,
    max_page_size: i64,
}

impl<E: ShelfExecutor> BookService<E> {
    pub fn new(executor: E, config: &ShelfConfig) -> Self {
        Self {
            executor,
            books: BookRepository::new(VersionedWriter::from_config(config)),
            max_page_size: config.max_page_size,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// # Errors
    ///
    /// Returns `ShelfError::Validation` for bad paging input, otherwise as
    /// [`BookRepository::get_all`].
    pub fn find_all(
        &self,
        title: &str,
        author: &str,
        user_id: i64,
        filters: &Filters,
    ) -> Result<(Vec<Book>, Metadata), ShelfError> {
        let filters = checked_filters(filters, &BOOK_SORT_SAFELIST, self.max_page_size)?;
        self.books
            .get_all(&self.executor, title, author, user_id, &filters)
    }

    /// # Errors
    ///
    /// As [`BookRepository::get_by_id`].
    pub fn find_by_id(&self, book_id: i64, user_id: i64) -> Result<Book, ShelfError> {
        self.books.get_by_id(&self.executor, book_id, user_id)
    }

    /// Validate and insert `book`; a book without a user is owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Validation` before any statement runs when the
    /// book is incomplete, otherwise as [`BookRepository::insert`].
    pub fn save(&self, book: &mut Book, user_id: i64) -> Result<(), ShelfError> {
        if book.user.is_none() {
            book.user = Some(User::with_id(user_id));
        }
        let mut v = Validator::new();
        book.validate(&mut v);
        v.into_result()?;

        run_in_transaction(&self.executor, |tx| self.books.insert(tx, book))
    }

    /// # Errors
    ///
    /// As [`save`](Self::save) and [`BookRepository::update`].
    pub fn update(&self, book: &mut Book, user_id: i64) -> Result<(), ShelfError> {
        let mut v = Validator::new();
        book.validate(&mut v);
        v.into_result()?;

        run_in_transaction(&self.executor, |tx| self.books.update(tx, book, user_id))
    }

    /// # Errors
    ///
    /// As [`BookRepository::delete`].
    pub fn delete(&self, book_id: i64, user_id: i64) -> Result<(), ShelfError> {
        run_in_transaction(&self.executor, |tx| {
            self.books.delete(tx, book_id, user_id)
        })
    }
}

pub struct ReadingPlanService<E: ShelfExecutor> {
    executor: E,
    plans: ReadingPlanRepository,
    max_page_size: i64,
}

impl<E: ShelfExecutor> ReadingPlanService<E> {
    pub fn new(executor: E, config: &ShelfConfig) -> Self {
        Self {
            executor,
            plans: ReadingPlanRepository::new(VersionedWriter::from_config(config)),
            max_page_size: config.max_page_size,
        }
    }

    /// # Errors
    ///
    /// Returns `ShelfError::Validation` for bad paging input, otherwise as
    /// [`ReadingPlanRepository::get_all`].
    pub fn find_all(
        &self,
        criteria: &PlanCriteria,
        filters: &Filters,
    ) -> Result<(Vec<ReadingPlan>, Metadata), ShelfError> {
        let filters = checked_filters(filters, &PLAN_SORT_SAFELIST, self.max_page_size)?;
        self.plans.get_all(&self.executor, criteria, &filters)
    }

    /// # Errors
    ///
    /// As [`ReadingPlanRepository::get_by_id`].
    pub fn find_by_id(&self, plan_id: i64, user_id: i64) -> Result<ReadingPlan, ShelfError> {
        self.plans.get_by_id(&self.executor, plan_id, user_id)
    }

    /// # Errors
    ///
    /// Returns `ShelfError::Validation` before any statement runs when the
    /// plan is incomplete, otherwise as [`ReadingPlanRepository::insert`].
    pub fn save(&self, plan: &mut ReadingPlan, user_id: i64) -> Result<(), ShelfError> {
        if plan.user.is_none() {
            plan.user = Some(User::with_id(user_id));
        }
        let mut v = Validator::new();
        plan.validate(&mut v);
        v.into_result()?;

        run_in_transaction(&self.executor, |tx| self.plans.insert(tx, plan))
    }

    /// # Errors
    ///
    /// As [`save`](Self::save) and [`ReadingPlanRepository::update`].
    pub fn update(&self, plan: &mut ReadingPlan, user_id: i64) -> Result<(), ShelfError> {
        let mut v = Validator::new();
        plan.validate(&mut v);
        v.into_result()?;

        run_in_transaction(&self.executor, |tx| self.plans.update(tx, plan, user_id))
    }

    /// # Errors
    ///
    /// As [`ReadingPlanRepository::delete`].
    pub fn delete(&self, plan_id: i64, user_id: i64) -> Result<(), ShelfError> {
        run_in_transaction(&self.executor, |tx| {
            self.plans.delete(tx, plan_id, user_id)
        })
    }
}

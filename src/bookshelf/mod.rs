//! Bookshelf domain built on shelfmap
//!
//! Users keep books and plan how to read them. Book queries are named
//! templates; reading-plan lookups and writes come from record metadata.
//!
//! ```no_run
//! use shelfmap::bookshelf::{Book, BookService};
//! use shelfmap::pagination::Filters;
//! use shelfmap::{PostgresExecutor, ShelfConfig};
//!
//! # fn main() -> Result<(), shelfmap::ShelfError> {
//! let config = ShelfConfig::default();
//! let executor = PostgresExecutor::connect(&config.url)?;
//! let service = BookService::new(executor, &config);
//!
//! let mut book = Book {
//!     title: "Dune".to_string(),
//!     author: "Frank Herbert".to_string(),
//!     pages: 412,
//!     description: "Desert planet".to_string(),
//!     ..Book::default()
//! };
//! service.save(&mut book, 7)?;
//!
//! let (books, metadata) = service.find_all("dune", "", 7, &Filters::new(1, 20, "-title"))?;
//! assert_eq!(metadata.total_records as usize, books.len());
//! # Ok(())
//! # }
//! ```

pub mod book_repository;
pub mod models;
pub mod reading_plan_repository;
pub mod service;

pub use book_repository::{book_constraints, BookRepository, BOOK_SORT_SAFELIST};
pub use models::{
    Book, BookDto, ReadingPlan, ReadingPlanDto, ReadingPriority, ReadingStatus, User, UserDto,
    DTO_TAG,
};
pub use reading_plan_repository::{PlanCriteria, ReadingPlanRepository, PLAN_SORT_SAFELIST};
pub use service::{BookService, ReadingPlanService};

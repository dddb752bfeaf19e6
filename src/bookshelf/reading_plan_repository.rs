//! Reading-plan persistence
//!
//! The listing is a named template; lookups and writes are built from the
//! record metadata.

use crate::bookshelf::models::{Book, ReadingPlan, ReadingStatus, User};
use crate::executor::{ShelfError, ShelfExecutor};
use crate::model::select_columns;
use crate::pagination::{get_by_query, paginated_query, Filters, Metadata};
use crate::query::{
    named_query, BuildStatement, Column, Condition, InsertBuilder, SelectBuilder, Statement,
    UpdateBuilder,
};
use crate::transaction::Transaction;
use crate::writer::{Ownership, VersionedWriter};
use crate::Record;
use chrono::{DateTime, Duration, Utc};

pub const PLAN_SORT_SAFELIST: [&str; 10] = [
    "id",
    "status",
    "priority",
    "start_date",
    "target_date",
    "-id",
    "-status",
    "-priority",
    "-start_date",
    "-target_date",
];

/// Listing criteria; `None` disables a filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanCriteria {
    pub status: Option<ReadingStatus>,
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive: plans ending any time on this day still match
    pub target_date: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub book_id: i64,
}

/// Paged listing of one user's plans for one book, each with its book and
/// user loaded
///
/// # Errors
///
/// Returns `ShelfError::Validation` when `filters.sort` is not in the
/// safelist.
pub fn list_statement(criteria: &PlanCriteria, filters: &Filters) -> Result<Statement, ShelfError> {
    let sort_column = filters.sort_column()?;
    let columns = [
        select_columns::<ReadingPlan>("r"),
        select_columns::<Book>("b"),
        select_columns::<User>("u"),
    ]
    .join(", ");
    let template = format!(
        "
        SELECT
            count(*) OVER(),
            {columns}
        FROM reading_plans r
        LEFT JOIN users u ON u.id = r.user_id
        LEFT JOIN books b ON b.id = r.book_id
        WHERE
            (:status::int IS NULL OR r.status = :status)
            AND (:startDate::timestamptz IS NULL OR r.start_date >= :startDate::timestamptz)
            AND (:targetDate::timestamptz IS NULL OR r.target_date <= :targetDate::timestamptz)
            AND b.deleted = false
            AND r.deleted = false
            AND r.user_id = :userID
            AND r.book_id = :bookID
        ORDER BY
            r.{sort_column} {direction},
            r.id ASC
        LIMIT :limit
        OFFSET :offset
        ",
        direction = filters.sort_direction(),
    );

    let end_of_target_day = criteria
        .target_date
        .map(|date| date + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59));

    named_query(
        &template,
        &named_params! {
            "status" => criteria.status,
            "startDate" => criteria.start_date,
            "targetDate" => end_of_target_day,
            "userID" => criteria.user_id,
            "bookID" => criteria.book_id,
            "limit" => filters.limit(),
            "offset" => filters.offset(),
        },
    )
}

/// Lookup of one live plan owned by `user_id`, with its book and user
pub fn by_id_statement(plan_id: i64, user_id: i64) -> Statement {
    SelectBuilder::from::<ReadingPlan>()
        .alias("r")
        .columns_of::<ReadingPlan>()
        .aliased_columns_of::<Book>("b")
        .aliased_columns_of::<User>("u")
        .join("LEFT JOIN books b ON b.id = r.book_id")
        .join("LEFT JOIN users u ON u.id = r.user_id")
        .filter(Column::new("r", "id").eq(plan_id))
        .filter(Column::new("r", "user_id").eq(user_id))
        .filter(Condition::raw("r.deleted = false", Vec::new()))
        .build()
}

fn with_joins() -> ReadingPlan {
    ReadingPlan {
        book: Some(Book::default()),
        user: Some(User::default()),
        ..ReadingPlan::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadingPlanRepository {
    writer: VersionedWriter,
}

impl ReadingPlanRepository {
    pub fn new(writer: VersionedWriter) -> Self {
        Self { writer }
    }

    /// # Errors
    ///
    /// As [`list_statement`] and [`paginated_query`].
    pub fn get_all<E: ShelfExecutor + ?Sized>(
        &self,
        executor: &E,
        criteria: &PlanCriteria,
        filters: &Filters,
    ) -> Result<(Vec<ReadingPlan>, Metadata), ShelfError> {
        let statement = list_statement(criteria, filters)?;
        paginated_query(executor, &statement, filters, with_joins)
    }

    /// # Errors
    ///
    /// Returns `ShelfError::NotFound` when the user owns no live plan `plan_id`.
    pub fn get_by_id<E: ShelfExecutor + ?Sized>(
        &self,
        executor: &E,
        plan_id: i64,
        user_id: i64,
    ) -> Result<ReadingPlan, ShelfError> {
        get_by_query(executor, &by_id_statement(plan_id, user_id), with_joins)
    }

    /// Insert `plan`, recording its user as the creator
    ///
    /// # Errors
    ///
    /// As [`VersionedWriter::insert`].
    pub fn insert<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        plan: &mut ReadingPlan,
    ) -> Result<(), ShelfError> {
        let user_id = plan.user.as_ref().map_or(0, |u| u.id);
        let builder = InsertBuilder::from_model(&*plan).value("created_by", user_id);
        self.writer.insert_model_with(tx, plan, builder)
    }

    /// Versioned update of a plan owned by `user_id`
    ///
    /// The plan stays with `user_id`; a different `plan.user` is replaced by a
    /// reference to that user before the statement is built.
    ///
    /// # Errors
    ///
    /// As [`VersionedWriter::update`].
    pub fn update<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        plan: &mut ReadingPlan,
        user_id: i64,
    ) -> Result<(), ShelfError> {
        if plan.user.as_ref().map(|u| u.id) != Some(user_id) {
            plan.user = Some(User::with_id(user_id));
        }
        let builder = UpdateBuilder::from_model(&*plan).set("updated_by", user_id);
        let ownership = Ownership::new("user_id", user_id);
        self.writer
            .update_model_with(tx, plan, builder, Some(&ownership))
    }

    /// # Errors
    ///
    /// Returns `ShelfError::NotFound` when no live plan matched.
    pub fn delete<E: ShelfExecutor + ?Sized>(
        &self,
        tx: &Transaction<'_, E>,
        plan_id: i64,
        user_id: i64,
    ) -> Result<(), ShelfError> {
        let statement = UpdateBuilder::table(ReadingPlan::meta().table)
            .set_raw("deleted = true")
            .set_raw("updated_at = now()")
            .set("updated_by", user_id)
            .filter(Column::bare("id").eq(plan_id))
            .filter(Column::bare("user_id").eq(user_id))
            .filter(Condition::raw("deleted = false", Vec::new()))
            .build();
        self.writer.soft_delete(tx, &statement)
    }
}

//! Bookshelf records and their transport shapes
//!
//! Persisted records (`User`, `Book`, `ReadingPlan`) carry `db` columns; the
//! `*Dto` records mirror them with nullable fields for the JSON boundary.
//! Conversion between the two goes through [`convert`] with the `dto` tag.

use crate::model::convert;
use crate::validation::Validator;
use crate::value::{TryGetable, ValueExtractionError, ValueType};
use crate::writer::Versioned;
use crate::Record;
use chrono::{DateTime, Utc};
use sea_query::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag key used for model to transport conversion
pub const DTO_TAG: &str = "dto";

/// Binds an integer-coded enum to `Value::Int` and its upper-case wire name
macro_rules! int_coded_enum {
    ($name:ident, $label:literal, { $($variant:ident = $code:literal => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn code(self) -> i32 {
                self as i32
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {other}", $label)),
                }
            }
        }

        impl ValueType for $name {
            fn into_value(self) -> Value {
                Value::Int(Some(self.code()))
            }

            fn from_value(value: Value) -> Option<Self> {
                i32::from_value(value).and_then(Self::from_code)
            }

            fn null_value() -> Value {
                Value::Int(None)
            }
        }

        impl TryGetable for $name {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                let code = i32::try_get(value)?;
                Self::from_code(code).ok_or_else(|| {
                    ValueExtractionError::ConversionError(format!("unknown {} code {code}", $label))
                })
            }
        }
    };
}

/// Progress of a reading plan, stored as an integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    Planned = 1,
    Reading = 2,
    Completed = 3,
    Paused = 4,
}

int_coded_enum!(ReadingStatus, "reading status", {
    Planned = 1 => "PLANNED",
    Reading = 2 => "READING",
    Completed = 3 => "COMPLETED",
    Paused = 4 => "PAUSED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingPriority {
    Low = 1,
    Medium = 2,
    High = 3,
}

int_coded_enum!(ReadingPriority, "reading priority", {
    Low = 1 => "LOW",
    Medium = 2 => "MEDIUM",
    High = 3 => "HIGH",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Record)]
pub struct User {
    #[record(db = "id", primary_key)]
    pub id: i64,
    #[record(db = "name")]
    pub name: String,
    #[record(db = "email")]
    pub email: String,
}

impl User {
    /// A reference to the user `id`, with no other field loaded
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn to_dto(&self) -> UserDto {
        to_dto(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Option<i64>,
    #[record(dto = "name")]
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UserDto {
    pub fn to_model(&self) -> User {
        from_dto(self)
    }
}

/// A book on a user's shelf
///
/// `user` is a reference through the `user_id` column; listings load the
/// whole user with a join.
#[derive(Debug, Clone, Default, PartialEq, Record)]
#[record(table = "books")]
pub struct Book {
    #[record(db = "id", primary_key)]
    pub id: i64,
    #[record(db = "title")]
    pub title: String,
    #[record(db = "author")]
    pub author: String,
    #[record(db = "pages")]
    pub pages: i32,
    #[record(db = "description")]
    pub description: String,
    #[record(db = "created_at", generated)]
    pub created_at: Option<DateTime<Utc>>,
    #[record(db = "version", generated)]
    pub version: i32,
    #[record(db = "user_id", nested)]
    pub user: Option<User>,
}

impl Book {
    /// Record field errors for a book about to be written
    ///
    /// ```rust
    /// use shelfmap::bookshelf::Book;
    /// use shelfmap::Validator;
    ///
    /// let mut v = Validator::new();
    /// Book::default().validate(&mut v);
    /// assert_eq!(v.errors().get("title"), Some("must be provided"));
    /// assert_eq!(v.errors().len(), 4);
    /// ```
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.title.is_empty(), "title", "must be provided");
        v.check(!self.author.is_empty(), "author", "must be provided");
        v.check(self.pages != 0, "pages", "must be provided");
        v.check(!self.description.is_empty(), "description", "must be provided");
    }

    pub fn to_dto(&self) -> BookDto {
        to_dto(self)
    }
}

impl Versioned for Book {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<i32>,
    pub description: Option<String>,
    #[record(nested)]
    pub user: Option<UserDto>,
}

impl BookDto {
    pub fn to_model(&self) -> Book {
        from_dto(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
#[record(table = "reading_plans")]
pub struct ReadingPlan {
    #[record(db = "id", primary_key)]
    pub id: i64,
    #[record(db = "status")]
    pub status: Option<ReadingStatus>,
    #[record(db = "start_date")]
    pub start_date: Option<DateTime<Utc>>,
    #[record(db = "target_date")]
    pub target_date: Option<DateTime<Utc>>,
    #[record(db = "priority")]
    pub priority: Option<ReadingPriority>,
    #[record(db = "pages_per_day")]
    pub pages_per_day: i32,
    #[record(db = "minutes_per_day")]
    pub minutes_per_day: i32,
    #[record(db = "created_at", generated)]
    pub created_at: Option<DateTime<Utc>>,
    #[record(db = "version", generated)]
    pub version: i32,
    #[record(db = "book_id", nested)]
    pub book: Option<Book>,
    #[record(db = "user_id", nested)]
    pub user: Option<User>,
}

impl ReadingPlan {
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.status.is_some(), "status", "must be provided");
        v.check(self.priority.is_some(), "priority", "must be provided");

        v.check(
            self.book.as_ref().is_some_and(|b| b.id != 0),
            "book",
            "must be provided",
        );
        v.check(
            self.user.as_ref().is_some_and(|u| u.id != 0),
            "user",
            "must be provided",
        );

        if self.pages_per_day == 0 && self.minutes_per_day == 0 {
            v.add_error("plan", "either pagesPerDay or minutesPerDay must be provided");
        }

        if let (Some(start), Some(target)) = (self.start_date, self.target_date) {
            v.check(target > start, "target_date", "must be after startDate");
        }
    }

    pub fn to_dto(&self) -> ReadingPlanDto {
        to_dto(self)
    }
}

impl Versioned for ReadingPlan {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPlanDto {
    pub id: Option<i64>,
    pub status: Option<ReadingStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub target_date: Option<DateTime<Utc>>,
    pub priority: Option<ReadingPriority>,
    pub pages_per_day: Option<i32>,
    pub minutes_per_day: Option<i32>,
    #[record(nested)]
    pub book: Option<BookDto>,
    #[record(nested)]
    pub user: Option<UserDto>,
}

impl ReadingPlanDto {
    pub fn to_model(&self) -> ReadingPlan {
        from_dto(self)
    }
}

// Skipped fields are logged by the conversion engine
fn to_dto<S: Record, D: Record + Default>(model: &S) -> D {
    convert::<S, D>(model, DTO_TAG).into_inner()
}

fn from_dto<S: Record, D: Record + Default>(dto: &S) -> D {
    convert::<S, D>(dto, DTO_TAG).into_inner()
}

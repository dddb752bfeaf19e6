//! Scripted in-memory executor shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_query::Value;
use shelfmap::{ShelfError, ShelfExecutor, ValueRow};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Answer to the next non-control statement
pub enum Reply {
    Rows(Vec<ValueRow>),
    Affected(u64),
    Error(ShelfError),
}

/// Executor that answers from a queue and records every statement
///
/// Transaction control and `SET` statements are answered with zero rows and
/// never consume a reply.
#[derive(Default)]
pub struct MockExecutor {
    replies: RefCell<VecDeque<Reply>>,
    log: RefCell<Vec<(String, Vec<Value>)>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn rows(&self, rows: Vec<Vec<Value>>) -> &Self {
        self.reply(Reply::Rows(
            rows.into_iter().map(ValueRow::from_values).collect(),
        ))
    }

    /// Every statement in execution order
    pub fn statements(&self) -> Vec<String> {
        self.log.borrow().iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Statements other than transaction control, with their values
    pub fn data_statements(&self) -> Vec<(String, Vec<Value>)> {
        self.log
            .borrow()
            .iter()
            .filter(|(sql, _)| !is_control(sql))
            .cloned()
            .collect()
    }

    /// Transaction control statements in execution order
    pub fn control_statements(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|sql| is_control(sql))
            .collect()
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.borrow().len()
    }

    fn record(&self, sql: &str, values: &[Value]) {
        self.log
            .borrow_mut()
            .push((sql.to_string(), values.to_vec()));
    }

    fn next_reply(&self, sql: &str) -> Reply {
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply for: {sql}"))
    }
}

impl ShelfExecutor for MockExecutor {
    fn execute(&self, sql: &str, values: &[Value]) -> Result<u64, ShelfError> {
        self.record(sql, values);
        if is_control(sql) {
            return Ok(0);
        }
        match self.next_reply(sql) {
            Reply::Affected(count) => Ok(count),
            Reply::Rows(rows) => Ok(rows.len() as u64),
            Reply::Error(err) => Err(err),
        }
    }

    fn query_all(&self, sql: &str, values: &[Value]) -> Result<Vec<ValueRow>, ShelfError> {
        self.record(sql, values);
        if is_control(sql) {
            return Ok(Vec::new());
        }
        match self.next_reply(sql) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Affected(_) => Ok(Vec::new()),
            Reply::Error(err) => Err(err),
        }
    }
}

fn is_control(sql: &str) -> bool {
    let sql = sql.trim_start();
    ["BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT", "RELEASE", "SET "]
        .iter()
        .any(|prefix| sql.starts_with(prefix))
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap()
}

pub fn big(v: i64) -> Value {
    Value::BigInt(Some(v))
}

pub fn int(v: i32) -> Value {
    Value::Int(Some(v))
}

pub fn text(v: &str) -> Value {
    Value::String(Some(v.to_string()))
}

pub fn at(v: DateTime<Utc>) -> Value {
    Value::ChronoDateTimeUtc(Some(v))
}

/// `id, created_at, version` as returned by a versioned insert
pub fn inserted_row(id: i64, version: i32) -> Vec<Value> {
    vec![big(id), at(timestamp()), int(version)]
}

/// Book columns followed by its owner's columns
pub fn book_columns(id: i64, title: &str, author: &str, pages: i32, user_id: i64) -> Vec<Value> {
    vec![
        big(id),
        text(title),
        text(author),
        int(pages),
        text("a description"),
        at(timestamp()),
        int(1),
        big(user_id),
    ]
}

pub fn user_columns(id: i64, name: &str) -> Vec<Value> {
    vec![big(id), text(name), text(&format!("{}@example.com", name.to_lowercase()))]
}

/// A book listing row: window count, book, user
pub fn book_listing_row(total: i64, id: i64, title: &str, user_id: i64, name: &str) -> Vec<Value> {
    let mut row = vec![big(total)];
    row.extend(book_columns(id, title, "Frank Herbert", 412, user_id));
    row.extend(user_columns(user_id, name));
    row
}

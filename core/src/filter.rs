//! Query options and local predicate filtering for task and category lists.
//!
//! # Design
//! Each query type knows which of its flags the list endpoint understands
//! (`params`) and re-applies every flag locally (`matches`). A cached list
//! fetched with broad flags can therefore answer a narrower query.

use crate::record::Record;

pub const STATUS_FIELD: &str = "status";
pub const DELETED_FLAG: &str = "isDeleted";
pub const DEFAULT_FLAG: &str = "isDefault";

/// Task lifecycle states as the service spells them.
pub const STATUS_UNCHECKED: &str = "UNCHECKED";
pub const STATUS_CHECKED: &str = "CHECKED";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_DELETED: &str = "DELETED";

/// Anything that decides whether a cached record belongs in a list result.
pub trait RecordFilter {
    fn matches(&self, record: &Record) -> bool;

    /// Query parameters the collection endpoint understands natively.
    fn params(&self) -> Vec<(String, String)>;
}

/// Options for `User::tasks`.
///
/// `include_deleted` and `include_done` are forwarded to the server and also
/// re-applied locally, so a cache fetched with broader flags still honors a
/// narrower query. The checked/unchecked predicates are local only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQuery {
    pub refresh: bool,
    pub include_deleted: bool,
    pub include_done: bool,
    pub include_checked: bool,
    pub include_unchecked: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            refresh: false,
            include_deleted: false,
            include_done: false,
            include_checked: true,
            include_unchecked: true,
        }
    }
}

impl TaskQuery {
    /// Everything the server has, fetched fresh.
    pub fn all() -> Self {
        Self {
            refresh: true,
            include_deleted: true,
            include_done: true,
            ..Self::default()
        }
    }

    pub fn refreshed(self) -> Self {
        Self {
            refresh: true,
            ..self
        }
    }
}

impl RecordFilter for TaskQuery {
    fn matches(&self, record: &Record) -> bool {
        (self.include_deleted || !is_deleted(record))
            && (self.include_done || !has_status(record, STATUS_DONE))
            && (self.include_checked || !has_status(record, STATUS_CHECKED))
            && (self.include_unchecked || !has_status(record, STATUS_UNCHECKED))
    }

    fn params(&self) -> Vec<(String, String)> {
        vec![
            ("includeDeleted".to_string(), self.include_deleted.to_string()),
            ("includeDone".to_string(), self.include_done.to_string()),
        ]
    }
}

/// Options for `User::categories`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryQuery {
    pub refresh: bool,
    pub include_deleted: bool,
}

impl CategoryQuery {
    pub fn refreshed(self) -> Self {
        Self {
            refresh: true,
            ..self
        }
    }
}

impl RecordFilter for CategoryQuery {
    fn matches(&self, record: &Record) -> bool {
        self.include_deleted || !record.flag(DELETED_FLAG)
    }

    fn params(&self) -> Vec<(String, String)> {
        vec![("includeDeleted".to_string(), self.include_deleted.to_string())]
    }
}

/// A task counts as deleted when flagged or when its status says so.
pub fn is_deleted(record: &Record) -> bool {
    record.flag(DELETED_FLAG) || has_status(record, STATUS_DELETED)
}

fn has_status(record: &Record, status: &str) -> bool {
    record.str_field(STATUS_FIELD) == Some(status)
}

//! Error types for task domain validation and parsing.

use super::TaskId;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// Date arithmetic left chrono's representable range.
    #[error("computed occurrence date out of range from {0}")]
    DateOutOfRange(DateTime<Utc>),

    /// A recurring task is missing its next occurrence date.
    ///
    /// `next_recurrence` is present if and only if the recurrence kind is
    /// not `None`, so hitting this indicates a corrupted stored row.
    #[error("recurring task {0} has no next recurrence date")]
    MissingNextRecurrence(TaskId),
}

/// Error returned while parsing stored enum values from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field} value: {value}")]
pub struct ParseEnumError {
    /// Name of the field being parsed.
    pub field: &'static str,
    /// The rejected raw value.
    pub value: String,
}

impl ParseEnumError {
    /// Creates a parse error for the named field.
    #[must_use]
    pub fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_owned(),
        }
    }
}

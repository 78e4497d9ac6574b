//! Error types for studyplan-core.
//!
//! Business-rule outcomes (unknown topics, missing configuration, empty
//! availability) are never errors. What remains is value validation, task
//! ownership rejections, and collaborator failures.

use thiserror::Error;

/// Rejected input when building a value type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid calendar date '{0}' (expected YYYY-MM-DD)")]
    InvalidCalendarDate(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("invalid minutes {0}: must be an integer within 0..=1440")]
    InvalidMinutes(i64),

    #[error("invalid hours {0}: must be within 0..=24")]
    InvalidHours(i64),

    #[error("invalid task type '{0}'")]
    InvalidTaskType(String),

    #[error("invalid weekday '{0}'")]
    InvalidWeekday(String),

    #[error("invalid elapsed time {0}s: must be positive")]
    InvalidElapsedTime(i64),

    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),
}

/// Rejection raised by a task's own mutation methods.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("user '{requester}' is not allowed to modify task '{task_id}'")]
    Unauthorized { requester: String, task_id: String },

    #[error("task '{0}' is not completed")]
    AlreadyIncomplete(String),
}

/// Result of a task use-case that did not go through.
#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Value(#[from] ValueError),

    /// The task repository or status source failed.
    #[error("collaborator failure: {0}")]
    Repository(#[from] anyhow::Error),
}

impl UseCaseError {
    /// Whether the caller should report this as a rejection rather than a fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, UseCaseError::Repository(_))
    }
}

pub type Result<T, E = UseCaseError> = std::result::Result<T, E>;

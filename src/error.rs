use thiserror::Error;

use crate::models::{OccurrenceStatus, TaskId};

/// Failures of the JSON-file collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    Json(#[from] serde_json::Error),
}

/// A lifecycle action applied to an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Assign,
    Unassign,
    Complete,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Transition::Assign => "assign",
            Transition::Unassign => "unassign",
            Transition::Complete => "complete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid lastCompleted '{value}' for task {task}")]
    InvalidDate { task: TaskId, value: String },
    #[error("Invalid frequency {frequency} for task '{task}': must be at least 1 day")]
    InvalidFrequency { task: String, frequency: i64 },
    #[error("Cannot {action} occurrence {occurrence} while it is {from}")]
    InvalidTransition {
        occurrence: String,
        from: OccurrenceStatus,
        action: Transition,
    },
    #[error("Occurrence {occurrence} does not belong to task {task}")]
    TaskMismatch { occurrence: String, task: TaskId },
    #[error("Task {0} not found")]
    TaskNotFound(String),
    #[error("Occurrence {0} not found")]
    OccurrenceNotFound(String),
    #[error("Id prefix '{0}' matches more than one record")]
    AmbiguousId(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = ScheduleError> = std::result::Result<T, E>;

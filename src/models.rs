use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::dates::{add_days, format_timestamp, parse_timestamp};
use crate::error::{Result, ScheduleError};

pub type TaskId = String;
pub type UserId = String;

/// A chore that comes back every `frequency_days` days.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTask {
    /// Unique identifier (ULID).
    pub id: TaskId,
    /// Display name of the chore.
    pub name: String,
    /// Days between two occurrences.
    #[serde(alias = "frequency")]
    pub frequency_days: i64,
    /// When the chore was last done. Kept as the raw persisted string so a
    /// damaged value only disables this one task.
    pub last_completed: String,
    /// Who last completed the chore, if anyone.
    #[serde(default)]
    pub completed_by: Option<UserId>,
}

impl RecurringTask {
    /// The parsed `last_completed` timestamp.
    pub fn last_completed_at(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.last_completed).ok_or_else(|| ScheduleError::InvalidDate {
            task: self.id.clone(),
            value: self.last_completed.clone(),
        })
    }
}

/// The fields a caller supplies when creating a task; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub frequency_days: i64,
    pub last_completed: String,
}

impl NewTask {
    /// A chore last done at `last_completed`.
    pub fn new(name: impl Into<String>, frequency_days: i64, last_completed: NaiveDateTime) -> Result<Self> {
        let name = name.into().trim().to_string();
        if frequency_days < 1 {
            return Err(ScheduleError::InvalidFrequency { task: name, frequency: frequency_days });
        }
        Ok(NewTask {
            name,
            frequency_days,
            last_completed: format_timestamp(last_completed),
        })
    }

    /// A chore whose first occurrence falls on `date`.
    ///
    /// Backdates `last_completed` by one interval so the projector's first
    /// step lands on the requested day.
    pub fn due_on(name: impl Into<String>, frequency_days: i64, date: NaiveDate) -> Result<Self> {
        let start = add_days(date, -frequency_days.max(1));
        Self::new(name, frequency_days, start.and_time(chrono::NaiveTime::MIN))
    }

    pub fn into_task(self, id: TaskId) -> RecurringTask {
        RecurringTask {
            id,
            name: self.name,
            frequency_days: self.frequency_days,
            last_completed: self.last_completed,
            completed_by: None,
        }
    }
}

/// Generates a fresh, collision resistant task id.
pub fn new_task_id() -> TaskId {
    Ulid::new().to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    Pending,
    Assigned,
    Completed,
}

impl std::fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OccurrenceStatus::Pending => "pending",
            OccurrenceStatus::Assigned => "assigned",
            OccurrenceStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// One dated instance of a recurring task inside the projection horizon.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub id: String,
    pub task_id: TaskId,
    pub task_name: String,
    pub date: NaiveDate,
    pub status: OccurrenceStatus,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

impl Occurrence {
    pub fn pending(task: &RecurringTask, date: NaiveDate) -> Self {
        Occurrence {
            id: occurrence_id(&task.id, date),
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            date,
            status: OccurrenceStatus::Pending,
            assigned_to: None,
        }
    }
}

/// Identifier of the occurrence of `task_id` on `date`. Deriving the same
/// logical occurrence twice yields the same id.
pub fn occurrence_id(task_id: &str, date: NaiveDate) -> String {
    format!("{}@{}", task_id, date.format("%Y-%m-%d"))
}

/// The persisted occurrence collection of one regeneration pass.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSnapshot {
    pub version: u64,
    #[serde(default)]
    pub generated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub horizon_days: i64,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

/// A household member. Only the id is referenced from tasks and occurrences.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub color: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        User { id: id.into(), name: name.into(), color: color.into() }
    }
}

/// The registry used when no users file exists yet.
pub fn default_users() -> Vec<User> {
    vec![
        User::new("user_1", "You", "teal"),
        User::new("user_2", "Partner", "purple"),
    ]
}

//! Per-occurrence state machine.
//!
//! `pending -> assigned -> completed`, with `assigned -> pending` as the only
//! way back. Completion acts through the owning task: it stamps the task's
//! `last_completed` and leaves the occurrence itself for the next
//! regeneration to drop.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::dates::format_timestamp;
use crate::error::{Result, ScheduleError, Transition};
use crate::models::{Occurrence, OccurrenceStatus, RecurringTask};

/// Whether `complete` accepts an occurrence nobody has claimed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionPolicy {
    pub allow_from_pending: bool,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        CompletionPolicy { allow_from_pending: true }
    }
}

impl Occurrence {
    /// Claims the occurrence for `user`. An already assigned occurrence is
    /// simply handed over to the new user.
    pub fn assign(&mut self, user: &str) -> Result<()> {
        match self.status {
            OccurrenceStatus::Pending | OccurrenceStatus::Assigned => {
                self.status = OccurrenceStatus::Assigned;
                self.assigned_to = Some(user.to_string());
                debug!(occurrence = %self.id, user, "assigned");
                Ok(())
            }
            OccurrenceStatus::Completed => Err(self.rejected(Transition::Assign)),
        }
    }

    pub fn unassign(&mut self) -> Result<()> {
        if self.status != OccurrenceStatus::Assigned {
            return Err(self.rejected(Transition::Unassign));
        }
        self.status = OccurrenceStatus::Pending;
        self.assigned_to = None;
        debug!(occurrence = %self.id, "unassigned");
        Ok(())
    }

    /// The calendar button: release the occurrence if `user` holds it,
    /// otherwise take it.
    pub fn toggle_assignment(&mut self, user: &str) -> Result<()> {
        if self.status == OccurrenceStatus::Assigned && self.assigned_to.as_deref() == Some(user) {
            self.unassign()
        } else {
            self.assign(user)
        }
    }

    /// Records `user` as having done the chore at `now` on the owning task.
    pub fn complete(
        &self,
        task: &mut RecurringTask,
        user: &str,
        now: NaiveDateTime,
        policy: CompletionPolicy,
    ) -> Result<()> {
        let allowed = match self.status {
            OccurrenceStatus::Assigned => true,
            OccurrenceStatus::Pending => policy.allow_from_pending,
            OccurrenceStatus::Completed => false,
        };
        if !allowed {
            return Err(self.rejected(Transition::Complete));
        }
        if task.id != self.task_id {
            return Err(ScheduleError::TaskMismatch {
                occurrence: self.id.clone(),
                task: task.id.clone(),
            });
        }
        task.last_completed = format_timestamp(now);
        task.completed_by = Some(user.to_string());
        debug!(occurrence = %self.id, task = %task.id, user, "completed");
        Ok(())
    }

    /// True when the assignment fields agree with the status.
    pub fn is_consistent(&self) -> bool {
        self.assigned_to.is_some() == (self.status == OccurrenceStatus::Assigned)
    }

    fn rejected(&self, action: Transition) -> ScheduleError {
        ScheduleError::InvalidTransition {
            occurrence: self.id.clone(),
            from: self.status,
            action,
        }
    }
}

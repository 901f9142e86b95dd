//! Keeps the occurrence set in step with the task collection.
//!
//! Every task mutation made through [`Schedule`] is followed by a full
//! regeneration: the occurrence set is projected again from the stored tasks
//! and handed to the sink in one `replace_all` call. Assignment changes
//! between regenerations patch the current set in place.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::{Config, RegenerationPolicy};
use crate::error::{Result, ScheduleError};
use crate::lifecycle::CompletionPolicy;
use crate::models::{occurrence_id, NewTask, Occurrence, OccurrenceStatus, ProjectionSnapshot, RecurringTask, TaskId};
use crate::projector::{project, DEFAULT_HORIZON_DAYS};
use crate::storage::{OccurrenceSink, TaskStore};
use crate::dates::format_timestamp;

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct FixedClock(Rc<Cell<NaiveDateTime>>);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        FixedClock(Rc::new(Cell::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

pub struct Schedule<S, K, C> {
    tasks: S,
    sink: K,
    clock: C,
    horizon_days: i64,
    regeneration: RegenerationPolicy,
    completion: CompletionPolicy,
    snapshot: ProjectionSnapshot,
}

impl<S: TaskStore, K: OccurrenceSink, C: Clock> Schedule<S, K, C> {
    /// Wraps the collaborators and picks up the last persisted occurrence set.
    pub fn new(tasks: S, sink: K, clock: C) -> Result<Self> {
        let snapshot = sink.load()?;
        Ok(Schedule {
            tasks,
            sink,
            clock,
            horizon_days: DEFAULT_HORIZON_DAYS,
            regeneration: RegenerationPolicy::default(),
            completion: CompletionPolicy::default(),
            snapshot,
        })
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.horizon_days = config.horizon_days.max(1);
        self.regeneration = config.regeneration;
        self.completion = config.completion;
        self
    }

    pub fn with_horizon(mut self, days: i64) -> Self {
        self.horizon_days = days.max(1);
        self
    }

    pub fn with_regeneration(mut self, policy: RegenerationPolicy) -> Self {
        self.regeneration = policy;
        self
    }

    pub fn with_completion(mut self, policy: CompletionPolicy) -> Self {
        self.completion = policy;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn snapshot(&self) -> &ProjectionSnapshot {
        &self.snapshot
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.snapshot.occurrences
    }

    pub fn occurrences_on(&self, date: NaiveDate) -> Vec<&Occurrence> {
        self.snapshot.occurrences.iter().filter(|o| o.date == date).collect()
    }

    pub fn tasks(&self) -> Result<Vec<RecurringTask>> {
        Ok(self.tasks.list()?)
    }

    /// Projects the stored tasks again and replaces the occurrence set.
    pub fn regenerate(&mut self) -> Result<()> {
        self.regenerate_with(self.regeneration)
    }

    /// Regenerates when the stored set was computed on an earlier day or for a
    /// different horizon. The task set has not changed in that case, so
    /// existing assignments are carried over. Returns whether it regenerated.
    pub fn refresh_if_stale(&mut self) -> Result<bool> {
        let today = self.clock.now().date();
        let fresh = self.snapshot.horizon_days == self.horizon_days
            && self.snapshot.generated_at.map(|at| at.date()) == Some(today);
        if fresh {
            return Ok(false);
        }
        debug!(version = self.snapshot.version, "occurrence set is stale");
        self.regenerate_with(RegenerationPolicy::Reconcile)?;
        Ok(true)
    }

    fn regenerate_with(&mut self, policy: RegenerationPolicy) -> Result<()> {
        let tasks = self.tasks.list()?;
        let now = self.clock.now();
        let mut occurrences = project(&tasks, now, self.horizon_days);

        if policy == RegenerationPolicy::Reconcile {
            let previous: HashMap<&str, &Occurrence> = self
                .snapshot
                .occurrences
                .iter()
                .filter(|o| o.status == OccurrenceStatus::Assigned)
                .map(|o| (o.id.as_str(), o))
                .collect();
            for occ in occurrences.iter_mut() {
                if let Some(old) = previous.get(occ.id.as_str()) {
                    occ.status = old.status;
                    occ.assigned_to = old.assigned_to.clone();
                }
            }
        }

        let snapshot = ProjectionSnapshot {
            version: self.snapshot.version + 1,
            generated_at: Some(now),
            horizon_days: self.horizon_days,
            occurrences,
        };
        self.sink.replace_all(&snapshot)?;
        debug!(
            version = snapshot.version,
            tasks = tasks.len(),
            occurrences = snapshot.occurrences.len(),
            "regenerated occurrences"
        );
        self.snapshot = snapshot;
        Ok(())
    }

    pub fn add_task(&mut self, task: NewTask) -> Result<TaskId> {
        let name = task.name.clone();
        let id = self.tasks.add(task)?;
        info!(task = %id, name = %name, "added task");
        self.regenerate()?;
        Ok(id)
    }

    /// Creates a chore whose first occurrence is `date` and optionally claims
    /// that occurrence for `assign_to`.
    pub fn create_task_on(
        &mut self,
        name: &str,
        frequency_days: i64,
        date: NaiveDate,
        assign_to: Option<&str>,
    ) -> Result<TaskId> {
        let id = self.add_task(NewTask::due_on(name, frequency_days, date)?)?;
        if let Some(user) = assign_to {
            let occ_id = occurrence_id(&id, date);
            if self.snapshot.occurrences.iter().any(|o| o.id == occ_id) {
                self.assign(&occ_id, user)?;
            } else {
                debug!(occurrence = %occ_id, "first occurrence is outside the horizon, not assigning");
            }
        }
        Ok(id)
    }

    pub fn update_task(&mut self, task: &RecurringTask) -> Result<()> {
        if task.frequency_days < 1 {
            return Err(ScheduleError::InvalidFrequency {
                task: task.name.clone(),
                frequency: task.frequency_days,
            });
        }
        if !self.tasks.update(task)? {
            return Err(ScheduleError::TaskNotFound(task.id.clone()));
        }
        info!(task = %task.id, "updated task");
        self.regenerate()
    }

    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        if !self.tasks.delete(id)? {
            return Err(ScheduleError::TaskNotFound(id.to_string()));
        }
        info!(task = id, "deleted task");
        self.regenerate()
    }

    /// Looks a task up by full id or unique case-insensitive prefix.
    pub fn find_task(&self, id: &str) -> Result<RecurringTask> {
        let tasks = self.tasks.list()?;
        let idx = resolve(tasks.iter().map(|t| t.id.as_str()).enumerate(), id)
            .ok_or_else(|| ScheduleError::TaskNotFound(id.to_string()))??;
        Ok(tasks[idx].clone())
    }

    /// Looks an occurrence up by full id or unique case-insensitive prefix.
    pub fn find_occurrence(&self, id: &str) -> Result<&Occurrence> {
        let idx = self.occurrence_index(id)?;
        Ok(&self.snapshot.occurrences[idx])
    }

    /// Accepts a full occurrence id, a unique prefix of one, or
    /// `<task id prefix>@<YYYY-MM-DD>`.
    fn occurrence_index(&self, id: &str) -> Result<usize> {
        let occurrences = &self.snapshot.occurrences;
        let found = match id.trim().split_once('@') {
            Some((task, date)) => resolve(
                occurrences
                    .iter()
                    .enumerate()
                    .filter(|(_, o)| o.date.format("%Y-%m-%d").to_string() == date.trim())
                    .map(|(idx, o)| (idx, o.task_id.as_str())),
                task,
            ),
            None => resolve(occurrences.iter().map(|o| o.id.as_str()).enumerate(), id),
        };
        found.ok_or_else(|| ScheduleError::OccurrenceNotFound(id.to_string()))?
    }

    pub fn assign(&mut self, occurrence: &str, user: &str) -> Result<()> {
        self.patch_occurrence(occurrence, |occ| occ.assign(user))
    }

    pub fn unassign(&mut self, occurrence: &str) -> Result<()> {
        self.patch_occurrence(occurrence, |occ| occ.unassign())
    }

    pub fn toggle_assignment(&mut self, occurrence: &str, user: &str) -> Result<()> {
        self.patch_occurrence(occurrence, |occ| occ.toggle_assignment(user))
    }

    fn patch_occurrence<F>(&mut self, occurrence: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Occurrence) -> Result<()>,
    {
        let idx = self.occurrence_index(occurrence)?;
        apply(&mut self.snapshot.occurrences[idx])?;
        self.sink.replace_all(&self.snapshot)?;
        let occ = &self.snapshot.occurrences[idx];
        info!(occurrence = %occ.id, status = %occ.status, "updated occurrence");
        Ok(())
    }

    /// Completes an occurrence on behalf of `user`. The owning task is
    /// stamped and saved, which regenerates the occurrence set. Returns the
    /// updated task.
    pub fn complete(&mut self, occurrence: &str, user: &str) -> Result<RecurringTask> {
        let occ = self.find_occurrence(occurrence)?.clone();
        let mut task = self.find_task(&occ.task_id)?;
        if task.id != occ.task_id {
            warn!(occurrence = %occ.id, "owning task no longer exists");
            return Err(ScheduleError::TaskNotFound(occ.task_id));
        }
        occ.complete(&mut task, user, self.clock.now(), self.completion)?;
        self.update_task(&task)?;
        Ok(task)
    }

    /// Marks a chore done right now without going through an occurrence.
    pub fn complete_task(&mut self, id: &str, user: &str) -> Result<RecurringTask> {
        let mut task = self.find_task(id)?;
        task.last_completed = format_timestamp(self.clock.now());
        task.completed_by = Some(user.to_string());
        self.update_task(&task)?;
        Ok(task)
    }
}

/// Index of the id equal to `needle`, or of the only id starting with it.
/// `None` if nothing matches; `Some(Err)` if the prefix is ambiguous.
fn resolve<'a>(ids: impl Iterator<Item = (usize, &'a str)>, needle: &str) -> Option<Result<usize>> {
    let needle_upper = needle.trim().to_ascii_uppercase();
    if needle_upper.is_empty() {
        return None;
    }
    let mut prefix_hits = Vec::new();
    for (idx, id) in ids {
        let upper = id.to_ascii_uppercase();
        if upper == needle_upper {
            return Some(Ok(idx));
        }
        if upper.starts_with(&needle_upper) {
            prefix_hits.push(idx);
        }
    }
    match prefix_hits.as_slice() {
        [] => None,
        [idx] => Some(Ok(*idx)),
        _ => Some(Err(ScheduleError::AmbiguousId(needle.to_string()))),
    }
}

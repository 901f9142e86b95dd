use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::dates::{dates_equal, format_timestamp, parse_timestamp};
use crate::models::{RecurringTask, UserId};
use crate::urgency::DueStatus;

/// A task together with its due status at report time.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDue {
    pub task: RecurringTask,
    pub status: DueStatus,
}

/// Household chore statistics at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub total: usize,
    pub overdue: Vec<TaskDue>,
    pub due_today: Vec<TaskDue>,
    /// Tasks whose last completion is within the past seven days.
    pub completed_this_week: usize,
    pub completed_today: usize,
    /// Last completions in the past seven days, per user.
    pub completions_by_user: BTreeMap<UserId, usize>,
    /// Tasks skipped because their last completion could not be read.
    pub unreadable: usize,
}

impl TaskReport {
    pub fn build(tasks: &[RecurringTask], now: NaiveDateTime) -> Self {
        let week_ago = now - Duration::days(7);
        let today = format_timestamp(now);
        let mut report = TaskReport {
            total: tasks.len(),
            overdue: Vec::new(),
            due_today: Vec::new(),
            completed_this_week: 0,
            completed_today: 0,
            completions_by_user: BTreeMap::new(),
            unreadable: 0,
        };

        for task in tasks {
            let (Some(status), Some(last)) = (DueStatus::for_task(task, now), parse_timestamp(&task.last_completed))
            else {
                report.unreadable += 1;
                continue;
            };
            if status.is_overdue() {
                report.overdue.push(TaskDue { task: task.clone(), status });
            } else if status.is_due_today() {
                report.due_today.push(TaskDue { task: task.clone(), status });
            }
            if last >= week_ago {
                report.completed_this_week += 1;
                if let Some(user) = &task.completed_by {
                    *report.completions_by_user.entry(user.clone()).or_insert(0) += 1;
                }
            }
            if dates_equal(&task.last_completed, &today) {
                report.completed_today += 1;
            }
        }

        // Most overdue first.
        report.overdue.sort_by_key(|d| d.status.days_left);
        report
    }

    pub fn on_track(&self) -> usize {
        self.total - self.unreadable - self.overdue.len() - self.due_today.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(18, 0, 0).unwrap()
    }

    fn task(id: &str, frequency: i64, hours_ago: i64, by: Option<&str>) -> RecurringTask {
        RecurringTask {
            id: id.into(),
            name: id.into(),
            frequency_days: frequency,
            last_completed: format_timestamp(now() - Duration::hours(hours_ago)),
            completed_by: by.map(str::to_string),
        }
    }

    #[test]
    fn buckets_tasks_by_due_status() {
        let tasks = vec![
            task("overdue", 3, 24 * 4, Some("user_1")),
            task("way-overdue", 1, 24 * 9, None),
            task("today", 3, 24 * 3, Some("user_2")),
            task("fresh", 7, 2, Some("user_2")),
            RecurringTask { last_completed: "??".into(), ..task("broken", 2, 0, None) },
        ];
        let report = TaskReport::build(&tasks, now());
        assert_eq!(report.total, 5);
        assert_eq!(report.unreadable, 1);
        let overdue: Vec<_> = report.overdue.iter().map(|d| d.task.id.as_str()).collect();
        assert_eq!(overdue, vec!["way-overdue", "overdue"]);
        assert_eq!(report.due_today.len(), 1);
        assert_eq!(report.due_today[0].task.id, "today");
        assert_eq!(report.completed_this_week, 3);
        assert_eq!(report.completed_today, 1);
        assert_eq!(report.completions_by_user.get("user_2"), Some(&2));
        assert_eq!(report.completions_by_user.get("user_1"), Some(&1));
        assert_eq!(report.on_track(), 1);
    }
}

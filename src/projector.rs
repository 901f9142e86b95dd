use chrono::NaiveDateTime;
use tracing::warn;

use crate::dates::add_days;
use crate::models::{Occurrence, RecurringTask};

/// How far ahead occurrences are materialised when nothing else is configured.
pub const DEFAULT_HORIZON_DAYS: i64 = 60;

/// Derives every occurrence in the window `(today, today + horizon_days]`.
///
/// Each task is walked forward from its last completion in steps of its
/// frequency. Tasks whose `last_completed` does not parse are skipped with a
/// warning; a non-positive frequency is clamped to one day. The output is
/// sorted by date, then task id, and depends only on the arguments.
pub fn project(tasks: &[RecurringTask], now: NaiveDateTime, horizon_days: i64) -> Vec<Occurrence> {
    let today = now.date();
    let end = add_days(today, horizon_days.max(0));
    let mut occurrences = Vec::new();

    for task in tasks {
        let last_completed = match task.last_completed_at() {
            Ok(at) => at,
            Err(err) => {
                warn!(task = %task.name, %err, "skipping task");
                continue;
            }
        };
        let frequency = if task.frequency_days < 1 {
            warn!(task = %task.name, frequency = task.frequency_days, "clamping invalid frequency to 1 day");
            1
        } else {
            task.frequency_days
        };

        let start = last_completed.date();
        let mut next = add_days(start, first_step(start, today, frequency) * frequency);
        while next <= end {
            if next > today {
                occurrences.push(Occurrence::pending(task, next));
            }
            let stepped = add_days(next, frequency);
            if stepped == next {
                break;
            }
            next = stepped;
        }
    }

    occurrences.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.task_id.cmp(&b.task_id)));
    occurrences.dedup_by(|a, b| a.id == b.id);
    occurrences
}

/// Index of the first step (at least 1) that could land after `today`.
/// Skips the run of past steps for tasks completed long ago.
fn first_step(start: chrono::NaiveDate, today: chrono::NaiveDate, frequency: i64) -> i64 {
    let elapsed = (today - start).num_days();
    if elapsed <= 0 {
        1
    } else {
        (elapsed / frequency).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn task(id: &str, frequency: i64, last_completed: &str) -> RecurringTask {
        RecurringTask {
            id: id.into(),
            name: format!("Chore {}", id),
            frequency_days: frequency,
            last_completed: last_completed.into(),
            completed_by: None,
        }
    }

    #[test]
    fn emits_every_step_inside_the_window() {
        let tasks = vec![task("a", 7, "2025-03-05T18:00:00")];
        let dates: Vec<_> = project(&tasks, now(), 30).into_iter().map(|o| o.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 19).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 26).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 9).unwrap(),
            ]
        );
    }

    #[test]
    fn horizon_end_is_inclusive_and_never_overshot() {
        // Steps fall on today + 2, + 4, + 6; a horizon of 5 stops before the third.
        let tasks = vec![task("a", 2, "2025-03-10T07:00:00")];
        let dates: Vec<_> = project(&tasks, now(), 5).into_iter().map(|o| o.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            ]
        );
        let dates: Vec<_> = project(&tasks, now(), 4).into_iter().map(|o| o.date).collect();
        assert_eq!(dates.last(), Some(&NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()));
    }

    #[test]
    fn completed_long_ago_matches_a_plain_walk() {
        let tasks = vec![task("a", 3, "2024-01-01T10:00:00")];
        let projected = project(&tasks, now(), 20);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = add_days(now().date(), 20);
        let mut expected = Vec::new();
        let mut next = start;
        loop {
            next = add_days(next, 3);
            if next > end {
                break;
            }
            if next > now().date() {
                expected.push(next);
            }
        }
        let dates: Vec<_> = projected.iter().map(|o| o.date).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn non_positive_frequency_is_clamped() {
        let tasks = vec![task("a", 0, "2025-03-09T10:00:00"), task("b", -4, "2025-03-09T10:00:00")];
        let projected = project(&tasks, now(), 3);
        assert_eq!(projected.len(), 6);
    }

    #[test]
    fn invalid_last_completed_only_skips_that_task() {
        let tasks = vec![task("bad", 2, "whenever"), task("good", 2, "2025-03-09T10:00:00")];
        let projected = project(&tasks, now(), 10);
        assert!(!projected.is_empty());
        assert!(projected.iter().all(|o| o.task_id == "good"));
    }

    #[test]
    fn zero_horizon_yields_nothing() {
        let tasks = vec![task("a", 1, "2025-03-09T10:00:00")];
        assert!(project(&tasks, now(), 0).is_empty());
    }
}

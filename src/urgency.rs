use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::models::RecurringTask;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days until the chore is due again, rounded up.
///
/// `ceil((last_completed + frequency_days - now) / 1 day)`: negative means
/// overdue, zero means due today. A due date past the representable range
/// saturates, so huge intervals read as far in the future.
pub fn days_until_due(last_completed: NaiveDateTime, frequency_days: i64, now: NaiveDateTime) -> i64 {
    let due = match Duration::try_days(frequency_days).and_then(|d| last_completed.checked_add_signed(d)) {
        Some(due) => due,
        None if frequency_days < 0 => NaiveDateTime::MIN,
        None => NaiveDateTime::MAX,
    };
    let millis = (due - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Coarse urgency bucket used for colouring and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Critical,
    High,
    Medium,
    Low,
}

impl UrgencyTier {
    pub fn from_days_left(days_left: i64) -> Self {
        if days_left <= 0 {
            UrgencyTier::Critical
        } else if days_left <= 1 {
            UrgencyTier::High
        } else if days_left <= 2 {
            UrgencyTier::Medium
        } else {
            UrgencyTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UrgencyTier::Critical => "critical",
            UrgencyTier::High => "high",
            UrgencyTier::Medium => "medium",
            UrgencyTier::Low => "low",
        }
    }
}

/// Share of the interval still left, clamped to `0.0..=1.0`.
pub fn progress_fraction(days_left: i64, frequency_days: i64) -> f64 {
    let frequency = frequency_days.max(1) as f64;
    (days_left as f64 / frequency).clamp(0.0, 1.0)
}

/// Everything the list, calendar and report views need about one chore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DueStatus {
    pub days_left: i64,
    pub tier: UrgencyTier,
    pub progress: f64,
}

impl DueStatus {
    /// `None` when the task's `last_completed` cannot be parsed.
    pub fn for_task(task: &RecurringTask, now: NaiveDateTime) -> Option<Self> {
        let last_completed = task.last_completed_at().ok()?;
        let frequency = task.frequency_days.max(1);
        let days_left = days_until_due(last_completed, frequency, now);
        Some(DueStatus {
            days_left,
            tier: UrgencyTier::from_days_left(days_left),
            progress: progress_fraction(days_left, frequency),
        })
    }

    pub fn is_overdue(&self) -> bool {
        self.days_left < 0
    }

    pub fn is_due_today(&self) -> bool {
        self.days_left == 0
    }
}

/// Human wording of a days-left value.
pub fn describe_days_left(days_left: i64) -> String {
    match days_left {
        0 => "Due today".to_string(),
        1 => "1 day left".to_string(),
        -1 => "1 day overdue".to_string(),
        d if d > 0 => format!("{} days left", d),
        d => format!("{} days overdue", d.abs()),
    }
}

/// Sorts tasks most urgent first; tasks without a readable date sink to the end.
pub fn sort_by_urgency(tasks: &mut [RecurringTask], now: NaiveDateTime) {
    tasks.sort_by_key(|t| {
        let days_left = DueStatus::for_task(t, now).map(|s| s.days_left).unwrap_or(i64::MAX);
        (days_left, t.name.to_lowercase())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_days_round_up() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let last = now - Duration::hours(30);
        // Due in 42 hours.
        assert_eq!(days_until_due(last, 3, now), 2);
        // Overdue by 6 hours still counts as due today.
        let last = now - Duration::hours(78);
        assert_eq!(days_until_due(last, 3, now), 0);
    }

    #[test]
    fn huge_intervals_saturate() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let far = days_until_due(now, 100_000_000, now);
        assert!(far > 365 * 200_000);
        assert_eq!(days_until_due(now, 200_000_000_000_000, now), days_until_due(now, i64::MAX, now));
        assert_eq!(UrgencyTier::from_days_left(far), UrgencyTier::Low);
    }

    #[test]
    fn tiers_follow_days_left() {
        assert_eq!(UrgencyTier::from_days_left(-3), UrgencyTier::Critical);
        assert_eq!(UrgencyTier::from_days_left(0), UrgencyTier::Critical);
        assert_eq!(UrgencyTier::from_days_left(1), UrgencyTier::High);
        assert_eq!(UrgencyTier::from_days_left(2), UrgencyTier::Medium);
        assert_eq!(UrgencyTier::from_days_left(3), UrgencyTier::Low);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_fraction(-2, 3), 0.0);
        assert_eq!(progress_fraction(3, 3), 1.0);
        assert_eq!(progress_fraction(9, 3), 1.0);
        assert!((progress_fraction(1, 4) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn wording() {
        assert_eq!(describe_days_left(0), "Due today");
        assert_eq!(describe_days_left(1), "1 day left");
        assert_eq!(describe_days_left(4), "4 days left");
        assert_eq!(describe_days_left(-1), "1 day overdue");
        assert_eq!(describe_days_left(-5), "5 days overdue");
    }
}

use choreboard::models::RecurringTask;
use choreboard::reports::TaskReport;
use choreboard::urgency::{days_until_due, describe_days_left, sort_by_urgency, DueStatus, UrgencyTier};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn task(name: &str, frequency: i64, last_completed: String) -> RecurringTask {
    RecurringTask {
        id: name.to_lowercase(),
        name: name.into(),
        frequency_days: frequency,
        last_completed,
        completed_by: None,
    }
}

#[test]
fn test_just_completed_has_full_interval_left() {
    let now = Local::now().naive_local();
    assert_eq!(days_until_due(now, 3, now), 3);
}

#[test]
fn test_overdue_is_negative() {
    let now = at(2025, 3, 10, 9);
    assert_eq!(days_until_due(now - Duration::days(4), 3, now), -1);
}

#[test]
fn test_weekly_chore_done_five_days_ago() {
    let now = at(2025, 3, 10, 9);
    let t = task("Laundry", 7, "2025-03-05T09:00:00".into());
    let status = DueStatus::for_task(&t, now).unwrap();
    assert_eq!(status.days_left, 2);
    assert_eq!(status.tier, UrgencyTier::Medium);
    assert!((status.progress - 2.0 / 7.0).abs() < 1e-9);
    assert!(!status.is_overdue());
}

#[test]
fn test_tier_boundaries() {
    assert_eq!(UrgencyTier::from_days_left(-10), UrgencyTier::Critical);
    assert_eq!(UrgencyTier::from_days_left(0), UrgencyTier::Critical);
    assert_eq!(UrgencyTier::from_days_left(1), UrgencyTier::High);
    assert_eq!(UrgencyTier::from_days_left(2), UrgencyTier::Medium);
    assert_eq!(UrgencyTier::from_days_left(3), UrgencyTier::Low);
}

#[test]
fn test_progress_is_clamped() {
    let now = at(2025, 3, 10, 9);
    let overdue = DueStatus::for_task(&task("Bins", 2, "2025-03-01T09:00:00".into()), now).unwrap();
    assert_eq!(overdue.progress, 0.0);
    assert!(overdue.is_overdue());

    let future = DueStatus::for_task(&task("Bins", 2, "2025-03-12T09:00:00".into()), now).unwrap();
    assert_eq!(future.progress, 1.0);
}

#[test]
fn test_unreadable_date_has_no_status() {
    let now = at(2025, 3, 10, 9);
    assert!(DueStatus::for_task(&task("Broken", 2, "yesterday".into()), now).is_none());
}

#[test]
fn test_sort_by_urgency() {
    let now = at(2025, 3, 10, 9);
    let mut tasks = vec![
        task("Fresh", 7, "2025-03-10T08:00:00".into()),
        task("Broken", 1, "not a date".into()),
        task("Overdue", 1, "2025-03-05T09:00:00".into()),
        task("Today", 3, "2025-03-07T09:00:00".into()),
    ];
    sort_by_urgency(&mut tasks, now);
    let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Overdue", "Today", "Fresh", "Broken"]);
}

#[test]
fn test_describe_days_left() {
    assert_eq!(describe_days_left(0), "Due today");
    assert_eq!(describe_days_left(4), "4 days left");
    assert_eq!(describe_days_left(-2), "2 days overdue");
}

#[test]
fn test_huge_interval_is_far_from_due() {
    let now = at(2025, 3, 10, 9);
    let t = task("Descale boiler", 100_000_000, "2025-03-10T09:00:00".into());
    let status = DueStatus::for_task(&t, now).unwrap();
    assert_eq!(status.tier, UrgencyTier::Low);
    assert!(status.progress > 0.9);

    let extreme = task("Repaint", 200_000_000_000_000, "2025-03-01T09:00:00".into());
    let report = TaskReport::build(&[t, extreme], now);
    assert_eq!(report.total, 2);
    assert!(report.overdue.is_empty());
    assert!(report.due_today.is_empty());
    assert_eq!(report.on_track(), 2);
}

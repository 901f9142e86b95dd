use choreboard::models::{occurrence_id, OccurrenceStatus, RecurringTask};
use choreboard::projector::project;
use choreboard::schedule::{FixedClock, Schedule};
use choreboard::storage::MemoryStore;
use chrono::{Duration, NaiveDate, NaiveDateTime};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(9, 30, 0).unwrap()
}

fn today() -> NaiveDate {
    now().date()
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

fn household() -> Vec<RecurringTask> {
    vec![
        task("toilets", 3, "2025-03-08T20:00:00"),
        task("bins", 7, "2025-01-02T07:15:00"),
        task("dishes", 1, "2025-03-10T08:00:00"),
        task("plants", 4, "2025-03-14"),
    ]
}

#[test]
fn test_occurrences_stay_inside_horizon_on_the_cadence() {
    let tasks = household();
    let occurrences = project(&tasks, now(), 30);
    assert!(!occurrences.is_empty());

    for occ in &occurrences {
        assert!(occ.date > today());
        assert!(occ.date <= today() + Duration::days(30));
        assert_eq!(occ.status, OccurrenceStatus::Pending);
        assert_eq!(occ.id, occurrence_id(&occ.task_id, occ.date));

        let t = tasks.iter().find(|t| t.id == occ.task_id).unwrap();
        let start = NaiveDate::parse_from_str(&t.last_completed[..10], "%Y-%m-%d").unwrap();
        assert_eq!((occ.date - start).num_days() % t.frequency_days, 0);
    }
}

#[test]
fn test_output_is_sorted_and_unique() {
    let occurrences = project(&household(), now(), 30);
    for pair in occurrences.windows(2) {
        let key = |o: &choreboard::models::Occurrence| (o.date, o.task_id.clone());
        assert!(key(&pair[0]) < key(&pair[1]));
    }
}

#[test]
fn test_projection_is_idempotent() {
    let tasks = household();
    assert_eq!(project(&tasks, now(), 45), project(&tasks, now(), 45));
}

#[test]
fn test_daily_chore_two_days_late_starts_tomorrow() {
    let occurrences = project(&[task("dishes", 1, "2025-03-08T09:30:00")], now(), 5);
    let dates: Vec<_> = occurrences.iter().map(|o| o.date).collect();
    let expected: Vec<_> = (1..=5).map(|d| today() + Duration::days(d)).collect();
    assert_eq!(dates, expected);
}

#[test]
fn test_old_completion_skips_past_steps() {
    let occurrences = project(&[task("bins", 7, "2025-01-02T07:15:00")], now(), 14);
    let dates: Vec<_> = occurrences.iter().map(|o| o.date).collect();
    // 2025-01-02 + 10 weeks = 2025-03-13, + 11 weeks = 2025-03-20
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 3, 13).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
        ]
    );
}

#[test]
fn test_invalid_last_completed_produces_nothing() {
    let tasks = vec![task("broken", 2, "sometime last week"), task("ok", 5, "2025-03-10")];
    let occurrences = project(&tasks, now(), 20);
    assert!(occurrences.iter().all(|o| o.task_id == "ok"));
    assert_eq!(occurrences.len(), 4);
}

#[test]
fn test_zero_horizon_is_empty() {
    assert!(project(&household(), now(), 0).is_empty());
}

#[test]
fn test_completion_restarts_the_cadence() {
    let store = MemoryStore::with_tasks(vec![task("toilets", 3, "2025-03-08T20:00:00")]);
    let clock = FixedClock::new(now());
    let mut schedule = Schedule::new(store.clone(), store, clock.clone()).unwrap().with_horizon(14);
    schedule.regenerate().unwrap();

    let first = schedule.occurrences()[0].clone();
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());

    clock.advance(Duration::days(1));
    schedule.assign(&first.id, "user_1").unwrap();
    let task = schedule.complete(&first.id, "user_1").unwrap();
    assert_eq!(task.last_completed, "2025-03-11T09:30:00");
    assert_eq!(task.completed_by.as_deref(), Some("user_1"));

    let dates: Vec<_> = schedule.occurrences().iter().map(|o| o.date).collect();
    assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    assert!(!dates.contains(&first.date));
    assert!(schedule.occurrences().iter().all(|o| o.status == OccurrenceStatus::Pending));
}

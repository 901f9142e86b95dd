//! Calendar arithmetic shared by the projector, calendar views and reports.
//!
//! Months are 1-based (January = 1) and weekdays are numbered from Sunday = 0.
//! Nothing in here reads the wall clock.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Number of days in `month` of `year`, or `None` for an invalid month.
///
/// Computed as "day 0 of the following month", i.e. the day before its 1st.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if month == 0 || month > 12 {
        return None;
    }
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_of_next.pred_opt().map(|d| d.day())
}

/// Weekday of the 1st of the month, 0 = Sunday .. 6 = Saturday.
pub fn first_weekday_of_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.weekday().num_days_from_sunday())
}

/// `date` shifted by `n` days; saturates at the representable range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    match Duration::try_days(n).and_then(|d| date.checked_add_signed(d)) {
        Some(shifted) => shifted,
        None if n < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// The Monday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let day = date.weekday().num_days_from_sunday() as i64;
    let offset = if day == 0 { -6 } else { 1 - day };
    add_days(date, offset)
}

/// True when both timestamps fall on the same calendar day. Time of day and
/// zone are ignored; an unparseable side makes the comparison false.
pub fn dates_equal(a: &str, b: &str) -> bool {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a.date() == b.date(),
        _ => false,
    }
}

/// Parses a persisted timestamp into local wall-clock time.
///
/// Accepts RFC 3339 (converted to the local zone), a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` or `YYYY-MM-DD HH:MM:SS`, or a bare
/// `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths_follow_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
        assert_eq!(days_in_month(2025, 0), None);
    }

    #[test]
    fn first_weekday_counts_from_sunday() {
        // 2025-01-01 is a Wednesday, 2024-09-01 a Sunday.
        assert_eq!(first_weekday_of_month(2025, 1), Some(3));
        assert_eq!(first_weekday_of_month(2024, 9), Some(0));
    }

    #[test]
    fn add_days_rolls_over_month_and_year() {
        assert_eq!(add_days(date(2024, 12, 30), 3), date(2025, 1, 2));
        assert_eq!(add_days(date(2024, 3, 1), -1), date(2024, 2, 29));
        assert_eq!(add_days(date(2024, 3, 1), 0), date(2024, 3, 1));
    }

    #[test]
    fn week_starts_on_monday() {
        assert_eq!(start_of_week(date(2024, 9, 1)), date(2024, 8, 26));
        assert_eq!(start_of_week(date(2024, 9, 2)), date(2024, 9, 2));
        assert_eq!(start_of_week(date(2024, 9, 4)), date(2024, 9, 2));
        assert_eq!(start_of_week(date(2024, 9, 7)), date(2024, 9, 2));
    }

    #[test]
    fn dates_equal_ignores_time_of_day() {
        assert!(dates_equal("2025-03-10T08:00:00", "2025-03-10T23:59:59"));
        assert!(dates_equal("2025-03-10", "2025-03-10 12:30:00"));
        assert!(!dates_equal("2025-03-10T08:00:00", "2025-03-11T08:00:00"));
        assert!(!dates_equal("not a date", "2025-03-10"));
        assert!(!dates_equal("", ""));
    }

    #[test]
    fn timestamps_round_trip_through_the_codec() {
        let dt = date(2025, 3, 10).and_hms_opt(9, 15, 0).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(dt)), Some(dt));
        assert_eq!(
            parse_timestamp("2025-03-10"),
            Some(date(2025, 3, 10).and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}

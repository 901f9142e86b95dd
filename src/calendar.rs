//! Month and week layouts of the occurrence set.

use chrono::{Datelike, NaiveDate};

use crate::dates::{add_days, days_in_month, first_weekday_of_month, start_of_week};
use crate::models::Occurrence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub occurrences: Vec<Occurrence>,
}

impl CalendarDay {
    fn collect(date: NaiveDate, today: NaiveDate, occurrences: &[Occurrence]) -> Self {
        CalendarDay {
            date,
            is_today: date == today,
            occurrences: occurrences.iter().filter(|o| o.date == date).cloned().collect(),
        }
    }
}

/// A month laid out Sunday-first; `None` cells pad the first week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<Option<CalendarDay>>,
}

impl MonthGrid {
    pub fn build(year: i32, month: u32, today: NaiveDate, occurrences: &[Occurrence]) -> Option<Self> {
        let len = days_in_month(year, month)?;
        let padding = first_weekday_of_month(year, month)?;
        let mut cells: Vec<Option<CalendarDay>> = (0..padding).map(|_| None).collect();
        for day in 1..=len {
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            cells.push(Some(CalendarDay::collect(date, today, occurrences)));
        }
        Some(MonthGrid { year, month, cells })
    }

    pub fn containing(date: NaiveDate, today: NaiveDate, occurrences: &[Occurrence]) -> Option<Self> {
        Self::build(date.year(), date.month(), today, occurrences)
    }

    /// The cells split into rows of seven; the last row may be short.
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<CalendarDay>]> {
        self.cells.chunks(7)
    }
}

/// Seven days starting on the Monday of the week containing `date`.
pub fn week_days(date: NaiveDate, today: NaiveDate, occurrences: &[Occurrence]) -> Vec<CalendarDay> {
    let monday = start_of_week(date);
    (0..7)
        .map(|i| CalendarDay::collect(add_days(monday, i), today, occurrences))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecurringTask;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn occurrence_on(d: NaiveDate) -> Occurrence {
        let task = RecurringTask {
            id: "t".into(),
            name: "Dust shelves".into(),
            frequency_days: 7,
            last_completed: "2024-01-01".into(),
            completed_by: None,
        };
        Occurrence::pending(&task, d)
    }

    #[test]
    fn month_grid_pads_to_the_first_weekday() {
        let occs = vec![occurrence_on(date(2024, 9, 10))];
        let grid = MonthGrid::build(2024, 9, date(2024, 9, 3), &occs).unwrap();
        // September 2024 starts on a Sunday.
        assert_eq!(grid.cells.len(), 30);
        assert!(grid.cells[0].is_some());

        let grid = MonthGrid::build(2025, 1, date(2024, 9, 3), &occs).unwrap();
        assert_eq!(grid.cells.len(), 3 + 31);
        assert!(grid.cells[..3].iter().all(Option::is_none));
        assert_eq!(grid.weeks().count(), 5);
    }

    #[test]
    fn days_carry_their_occurrences_and_today_flag() {
        let occs = vec![occurrence_on(date(2024, 9, 10))];
        let grid = MonthGrid::build(2024, 9, date(2024, 9, 3), &occs).unwrap();
        let days: Vec<_> = grid.cells.iter().flatten().collect();
        assert!(days[2].is_today);
        assert_eq!(days[9].occurrences.len(), 1);
        assert_eq!(days.iter().map(|d| d.occurrences.len()).sum::<usize>(), 1);
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        let days = week_days(date(2024, 9, 4), date(2024, 9, 4), &[]);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date(2024, 9, 2));
        assert_eq!(days[6].date, date(2024, 9, 8));
        assert!(days[2].is_today);
    }
}

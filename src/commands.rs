use std::io::{self, Write};

use chrono::{Datelike, Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::calendar::{week_days, MonthGrid};
use crate::config::Config;
use crate::dates::{add_days, parse_timestamp};
use crate::error::Result;
use crate::models::{occurrence_id, NewTask, Occurrence, OccurrenceStatus};
use crate::reports::TaskReport;
use crate::schedule::{Schedule, SystemClock};
use crate::storage::{JsonStore, UserDirectory};
use crate::urgency::{describe_days_left, sort_by_urgency, DueStatus, UrgencyTier};

pub type JsonSchedule = Schedule<JsonStore, JsonStore, SystemClock>;

/// Opens the schedule for the configured data directory, regenerating the
/// occurrence set if it was computed on an earlier day.
pub fn open_schedule(config: &Config) -> Result<JsonSchedule> {
    let store = JsonStore::open(&config.data_dir);
    let mut schedule = Schedule::new(store.clone(), store, SystemClock)?.with_config(config);
    schedule.refresh_if_stale()?;
    Ok(schedule)
}

/// Runs one mutating command and prints its outcome.
fn run<F>(silent: bool, action: F)
where
    F: FnOnce(&mut JsonSchedule, &JsonStore) -> Result<String>,
{
    let config = Config::from_env();
    let users = JsonStore::open(&config.data_dir);
    let outcome = open_schedule(&config).and_then(|mut schedule| action(&mut schedule, &users));
    match outcome {
        Ok(message) => {
            if !silent {
                println!("{}", message);
            }
        }
        Err(e) => {
            if !silent {
                eprintln!("{}", e);
            }
        }
    }
}

fn parse_day(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}. Use YYYY-MM-DD.", value, e))
}

/// First sixteen characters of a ULID: the ten timestamp characters plus six
/// random ones, so ids minted in the same millisecond still differ. Accepted
/// back as an id prefix.
pub fn short_id(id: &str) -> &str {
    id.get(..16).unwrap_or(id)
}

/// The occurrence id as shown in tables: short task id plus date.
pub fn short_occurrence_id(occ: &Occurrence) -> String {
    format!("{}@{}", short_id(&occ.task_id), occ.date.format("%Y-%m-%d"))
}

/// A text timer bar, full when the chore was just done.
pub fn timer_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn tier_color(tier: UrgencyTier) -> Color {
    match tier {
        UrgencyTier::Critical => Color::Red,
        UrgencyTier::High => Color::DarkYellow,
        UrgencyTier::Medium => Color::Yellow,
        UrgencyTier::Low => Color::Green,
    }
}

/// Adds a new recurring chore.
///
/// Without `due` the chore counts as done right now and first comes back in
/// `every` days. With `due` its first occurrence lands on that date. `assign`
/// claims the first occurrence for `user`.
pub fn cmd_add(name: String, every: i64, due: Option<String>, assign: bool, user: &str, silent: bool) {
    if name.trim().is_empty() {
        if !silent { eprintln!("Task name cannot be empty."); }
        return;
    }
    let due_date = match due.as_deref().map(parse_day).transpose() {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    run(silent, |schedule, _| {
        let assign_to = assign.then_some(user);
        let id = match due_date {
            Some(date) => schedule.create_task_on(&name, every, date, assign_to)?,
            None => {
                let now = schedule.now();
                let id = schedule.add_task(NewTask::new(name.as_str(), every, now)?)?;
                if let Some(user) = assign_to {
                    let first = occurrence_id(&id, add_days(now.date(), every));
                    if schedule.find_occurrence(&first).is_ok() {
                        schedule.assign(&first, user)?;
                    }
                }
                id
            }
        };
        Ok(format!("Task added (id = {})", short_id(&id)))
    });
}

/// Changes a chore's name or interval.
pub fn cmd_edit(id: String, name: Option<String>, every: Option<i64>, silent: bool) {
    run(silent, |schedule, _| {
        let mut task = schedule.find_task(&id)?;
        if let Some(n) = name { task.name = n.trim().to_string(); }
        if let Some(f) = every { task.frequency_days = f; }
        schedule.update_task(&task)?;
        Ok(format!("Task {} updated.", short_id(&task.id)))
    });
}

pub fn cmd_remove(id: String, silent: bool) {
    run(silent, |schedule, _| {
        let task = schedule.find_task(&id)?;
        schedule.delete_task(&task.id)?;
        Ok(format!("Task {} removed.", short_id(&task.id)))
    });
}

/// Marks a chore done now, regardless of its occurrences.
pub fn cmd_done(id: String, user: &str, silent: bool) {
    run(silent, |schedule, users| {
        let task = schedule.complete_task(&id, user)?;
        Ok(format!("'{}' done by {}.", task.name, users.display_name(user)))
    });
}

pub fn cmd_assign(occurrence: String, user: &str, silent: bool) {
    run(silent, |schedule, users| {
        schedule.assign(&occurrence, user)?;
        let occ = schedule.find_occurrence(&occurrence)?;
        Ok(format!("'{}' on {} assigned to {}.", occ.task_name, occ.date, users.display_name(user)))
    });
}

pub fn cmd_unassign(occurrence: String, silent: bool) {
    run(silent, |schedule, _| {
        schedule.unassign(&occurrence)?;
        let occ = schedule.find_occurrence(&occurrence)?;
        Ok(format!("'{}' on {} is unassigned.", occ.task_name, occ.date))
    });
}

/// Completes an occurrence; the chore's schedule restarts from now.
pub fn cmd_complete(occurrence: String, user: &str, silent: bool) {
    run(silent, |schedule, users| {
        let task = schedule.complete(&occurrence, user)?;
        let next = schedule
            .occurrences()
            .iter()
            .find(|o| o.task_id == task.id)
            .map(|o| format!(" Next one on {}.", o.date))
            .unwrap_or_default();
        Ok(format!("'{}' completed by {}.{}", task.name, users.display_name(user), next))
    });
}

/// Forces a full regeneration of the occurrence set.
pub fn cmd_regenerate(silent: bool) {
    run(silent, |schedule, _| {
        schedule.regenerate()?;
        Ok(format!(
            "Regenerated {} occurrences (version {}).",
            schedule.occurrences().len(),
            schedule.version()
        ))
    });
}

/// Lists chores, most urgent first, with their timer bars.
pub fn cmd_list() {
    let config = Config::from_env();
    let store = JsonStore::open(&config.data_dir);
    let mut tasks = store.load_tasks();
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    let now = Local::now().naive_local();
    sort_by_urgency(&mut tasks, now);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Every").add_attribute(Attribute::Bold),
            Cell::new("Last done").add_attribute(Attribute::Bold),
            Cell::new("Time Left").add_attribute(Attribute::Bold),
            Cell::new("Urgency").add_attribute(Attribute::Bold),
            Cell::new("Timer").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let last_done = match (parse_timestamp(&t.last_completed), &t.completed_by) {
            (Some(at), Some(by)) => format!("{} by {}", at.date(), store.display_name(by)),
            (Some(at), None) => at.date().to_string(),
            (None, _) => format!("invalid ({})", t.last_completed),
        };
        let (time_left, urgency, timer) = match DueStatus::for_task(&t, now) {
            Some(status) => (
                Cell::new(describe_days_left(status.days_left)).fg(tier_color(status.tier)),
                Cell::new(status.tier.label()).fg(tier_color(status.tier)),
                Cell::new(timer_bar(status.progress, 10)).fg(tier_color(status.tier)),
            ),
            None => (Cell::new("-"), Cell::new("-"), Cell::new("")),
        };
        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.name),
            Cell::new(format!("{}d", t.frequency_days)),
            Cell::new(last_done),
            time_left,
            urgency,
            timer,
        ]);
    }

    println!("{table}");
}

/// Lists projected occurrences for the next `days` days (whole horizon by default).
pub fn cmd_upcoming(days: Option<i64>) {
    let config = Config::from_env();
    let store = JsonStore::open(&config.data_dir);
    let schedule = match open_schedule(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let today = schedule.now().date();
    let end = add_days(today, days.unwrap_or(schedule.horizon_days()));
    let occurrences: Vec<&Occurrence> = schedule.occurrences().iter().filter(|o| o.date <= end).collect();
    if occurrences.is_empty() {
        println!("Nothing scheduled.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Chore").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Assigned").add_attribute(Attribute::Bold),
        ]);
    for occ in occurrences {
        let status_color = match occ.status {
            OccurrenceStatus::Pending => Color::Yellow,
            OccurrenceStatus::Assigned => Color::Cyan,
            OccurrenceStatus::Completed => Color::Green,
        };
        table.add_row(vec![
            Cell::new(short_occurrence_id(occ)),
            Cell::new(occ.date.format("%a %Y-%m-%d")),
            Cell::new(&occ.task_name),
            Cell::new(occ.status).fg(status_color),
            Cell::new(occ.assigned_to.as_deref().map(|u| store.display_name(u)).unwrap_or_default()),
        ]);
    }
    println!("{table}");
}

/// Prints the month containing `date` (today by default), or its week.
pub fn cmd_calendar(week: bool, date: Option<String>) {
    let config = Config::from_env();
    let store = JsonStore::open(&config.data_dir);
    let schedule = match open_schedule(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let today = schedule.now().date();
    let anchor = match date.as_deref().map(parse_day).transpose() {
        Ok(d) => d.unwrap_or(today),
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let label = |occ: &Occurrence| match &occ.assigned_to {
        Some(user) => format!("{} ({})", occ.task_name, store.display_name(user)),
        None => occ.task_name.clone(),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);

    if week {
        table.set_header(vec!["Day", "Chores"]);
        for day in week_days(anchor, today, schedule.occurrences()) {
            let chores: Vec<String> = day.occurrences.iter().map(label).collect();
            let mut head = Cell::new(day.date.format("%a %d %b"));
            if day.is_today {
                head = head.add_attribute(Attribute::Bold).fg(Color::Cyan);
            }
            table.add_row(vec![head, Cell::new(chores.join("\n"))]);
        }
        println!("Week of {}", crate::dates::start_of_week(anchor));
    } else {
        let Some(grid) = MonthGrid::containing(anchor, today, schedule.occurrences()) else {
            eprintln!("Cannot lay out the month of {}", anchor);
            return;
        };
        table.set_header(vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
        for row in grid.weeks() {
            let cells: Vec<Cell> = row
                .iter()
                .map(|cell| match cell {
                    None => Cell::new(""),
                    Some(day) => {
                        let mut lines = vec![day.date.day().to_string()];
                        lines.extend(day.occurrences.iter().map(label));
                        let c = Cell::new(lines.join("\n"));
                        if day.is_today { c.fg(Color::Cyan).add_attribute(Attribute::Bold) } else { c }
                    }
                })
                .collect();
            table.add_row(cells);
        }
        println!("{}", anchor.format("%B %Y"));
    }
    println!("{table}");
}

/// Prints overdue and due-today chores and this week's activity.
pub fn cmd_report() {
    let config = Config::from_env();
    let store = JsonStore::open(&config.data_dir);
    let tasks = store.load_tasks();
    let report = TaskReport::build(&tasks, Local::now().naive_local());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Total", "Overdue", "Due today", "On track", "Done this week"]);
    table.add_row(vec![
        Cell::new(report.total),
        Cell::new(report.overdue.len()).fg(if report.overdue.is_empty() { Color::Reset } else { Color::Red }),
        Cell::new(report.due_today.len()).fg(if report.due_today.is_empty() { Color::Reset } else { Color::Yellow }),
        Cell::new(report.on_track()),
        Cell::new(report.completed_this_week),
    ]);
    println!("{table}");

    if !report.overdue.is_empty() {
        println!("\nOverdue:");
        for d in &report.overdue {
            println!("  {} ({})", d.task.name, describe_days_left(d.status.days_left));
        }
    }
    if !report.due_today.is_empty() {
        println!("\nDue today:");
        for d in &report.due_today {
            println!("  {}", d.task.name);
        }
    }
    if !report.completions_by_user.is_empty() {
        println!("\nDone this week by:");
        for (user, count) in &report.completions_by_user {
            println!("  {}: {}", store.display_name(user), count);
        }
    }
    if report.unreadable > 0 {
        println!("\n{} task(s) have an unreadable last-completed date.", report.unreadable);
    }
}

pub fn cmd_user_list() {
    let config = Config::from_env();
    let store = JsonStore::open(&config.data_dir);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["ID", "Name", "Color"]);
    for u in store.list() {
        table.add_row(vec![u.id, u.name, u.color]);
    }
    println!("{table}");
}

pub fn cmd_user_rename(id: String, name: String, silent: bool) {
    if name.trim().is_empty() {
        if !silent { eprintln!("User name cannot be empty."); }
        return;
    }
    let config = Config::from_env();
    let store = JsonStore::open(&config.data_dir);
    match store.rename_user(&id, &name) {
        Ok(true) => { if !silent { println!("User {} renamed to '{}'.", id, name.trim()); } }
        Ok(false) => { if !silent { eprintln!("User {} not found.", id); } }
        Err(e) => { if !silent { eprintln!("Failed to save users: {}", e); } }
    }
}

/// Deletes all tasks, occurrences and users.
pub fn cmd_reset(force: bool) {
    if !force {
        print!("Are you sure you want to delete all chores and occurrences? This cannot be undone. [y/N] ");
        let mut input = String::new();
        if io::stdout().flush().is_err() || io::stdin().read_line(&mut input).is_err() {
            println!("Aborted.");
            return;
        }
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    let config = Config::from_env();
    if let Err(e) = JsonStore::open(&config.data_dir).delete_database() {
        eprintln!("Failed to reset database: {}", e);
    } else {
        println!("Database reset successfully.");
    }
}

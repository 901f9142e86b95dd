//! Recurring household chores projected onto a calendar.
//!
//! Tasks carry a cadence and a last-completion timestamp. [`projector`] turns
//! them into dated occurrences inside a horizon, [`lifecycle`] moves those
//! occurrences through pending, assigned and completed, [`urgency`] tells how
//! close each chore is to being due, and [`schedule`] regenerates the whole
//! occurrence set whenever the task collection changes.

pub mod calendar;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod projector;
pub mod reports;
pub mod schedule;
pub mod storage;
pub mod tui;
pub mod urgency;

pub use error::{ScheduleError, StoreError};
pub use schedule::{Clock, FixedClock, Schedule, SystemClock};

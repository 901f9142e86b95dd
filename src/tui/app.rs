use chrono::NaiveDate;
use ratatui::widgets::TableState;

use crate::calendar::{week_days, CalendarDay};
use crate::commands::{open_schedule, short_id};
use crate::config::Config;
use crate::dates::add_days;
use crate::error::Result;
use crate::models::{NewTask, Occurrence, RecurringTask};
use crate::reports::TaskReport;
use crate::schedule::{Clock, Schedule, SystemClock};
use crate::storage::{JsonStore, UserDirectory};
use crate::urgency::sort_by_urgency;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Chores,
    Week,
    Report,
}

pub enum InputField {
    None,
    Name,
    Every,
}

pub struct App<C: Clock = SystemClock> {
    pub schedule: Schedule<JsonStore, JsonStore, C>,
    pub users: JsonStore,
    pub user: String,
    pub tasks: Vec<RecurringTask>,
    pub state: TableState,
    pub week: Vec<CalendarDay>,
    pub week_items: Vec<Occurrence>,
    pub week_state: TableState,
    pub week_anchor: NaiveDate,
    pub report: TaskReport,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<String>,
    pub add_state: AddState,
    /// Outcome of the last action, shown in the help bar.
    pub message: Option<String>,
}

/// State for the two-step "Add Chore" wizard.
#[derive(Default)]
pub struct AddState {
    pub name: String,
    pub step: usize, // 0: Name, 1: Every
}

impl App {
    /// Opens the schedule and loads the initial views.
    pub fn new(user: &str) -> Result<App> {
        let config = Config::from_env();
        let schedule = open_schedule(&config)?;
        Ok(App::with_schedule(schedule, JsonStore::open(&config.data_dir), user))
    }
}

impl<C: Clock> App<C> {
    pub fn with_schedule(schedule: Schedule<JsonStore, JsonStore, C>, users: JsonStore, user: &str) -> App<C> {
        let today = schedule.now().date();
        let report = TaskReport::build(&[], schedule.now());
        let mut app = App {
            schedule,
            users,
            user: user.to_string(),
            tasks: Vec::new(),
            state: TableState::default(),
            week: Vec::new(),
            week_items: Vec::new(),
            week_state: TableState::default(),
            week_anchor: today,
            report,
            view_mode: ViewMode::Chores,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            message: None,
        };
        app.reload();
        app
    }

    pub fn user_name(&self) -> String {
        self.users.display_name(&self.user)
    }

    /// Selects the next row in the current view.
    pub fn next(&mut self) {
        let (len, state) = match self.view_mode {
            ViewMode::Chores => (self.tasks.len(), &mut self.state),
            ViewMode::Week => (self.week_items.len(), &mut self.week_state),
            ViewMode::Report => return,
        };
        if len == 0 { return; }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous row in the current view.
    pub fn previous(&mut self) {
        let (len, state) = match self.view_mode {
            ViewMode::Chores => (self.tasks.len(), &mut self.state),
            ViewMode::Week => (self.week_items.len(), &mut self.week_state),
            ViewMode::Report => return,
        };
        if len == 0 { return; }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&RecurringTask> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    fn selected_occurrence(&self) -> Option<&Occurrence> {
        self.week_state.selected().and_then(|i| self.week_items.get(i))
    }

    /// Records the outcome of an action and refreshes every view.
    fn settle(&mut self, outcome: Result<String>) {
        self.message = Some(match outcome {
            Ok(msg) => msg,
            Err(e) => e.to_string(),
        });
        self.reload();
    }

    /// Marks the selected chore done now.
    pub fn complete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Chores => {
                let Some(id) = self.selected_task().map(|t| t.id.clone()) else { return };
                let user = self.user.clone();
                let outcome = self.schedule.complete_task(&id, &user).map(|t| format!("'{}' done.", t.name));
                self.settle(outcome);
            }
            ViewMode::Week => {
                let Some(id) = self.selected_occurrence().map(|o| o.id.clone()) else { return };
                let user = self.user.clone();
                let outcome = self.schedule.complete(&id, &user).map(|t| format!("'{}' completed.", t.name));
                self.settle(outcome);
            }
            ViewMode::Report => {}
        }
    }

    /// Claims the selected occurrence, or releases it if it is already ours.
    pub fn toggle_selected(&mut self) {
        if self.view_mode != ViewMode::Week { return; }
        let Some(occ) = self.selected_occurrence().cloned() else { return };
        let user = self.user.clone();
        let outcome = self.schedule.toggle_assignment(&occ.id, &user).map(|_| {
            match self.schedule.find_occurrence(&occ.id).ok().and_then(|o| o.assigned_to.clone()) {
                Some(_) => format!("'{}' on {} is yours.", occ.task_name, occ.date),
                None => format!("'{}' on {} released.", occ.task_name, occ.date),
            }
        });
        self.settle(outcome);
    }

    /// Deletes the selected chore.
    pub fn delete_selected(&mut self) {
        if self.view_mode != ViewMode::Chores { return; }
        let Some(task) = self.selected_task().cloned() else { return };
        let outcome = self.schedule.delete_task(&task.id).map(|_| format!("'{}' removed.", task.name));
        self.settle(outcome);
    }

    /// Moves the week view by `weeks`; zero jumps back to the current week.
    pub fn shift_week(&mut self, weeks: i64) {
        if self.view_mode != ViewMode::Week { return; }
        self.week_anchor = if weeks == 0 {
            self.schedule.now().date()
        } else {
            add_days(self.week_anchor, weeks * 7)
        };
        self.week_state.select(None);
        self.reload();
    }

    /// Reloads chores, the week and the report from the schedule.
    pub fn reload(&mut self) {
        // The board may stay open across midnight.
        if let Err(e) = self.schedule.refresh_if_stale() {
            self.message = Some(e.to_string());
        }
        let now = self.schedule.now();
        let mut tasks = match self.schedule.tasks() {
            Ok(tasks) => tasks,
            Err(e) => {
                self.message = Some(e.to_string());
                Vec::new()
            }
        };
        self.report = TaskReport::build(&tasks, now);
        sort_by_urgency(&mut tasks, now);
        self.tasks = tasks;
        clamp_selection(&mut self.state, self.tasks.len());

        self.week = week_days(self.week_anchor, now.date(), self.schedule.occurrences());
        self.week_items = self.week.iter().flat_map(|d| d.occurrences.iter().cloned()).collect();
        clamp_selection(&mut self.week_state, self.week_items.len());
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Chores => ViewMode::Week,
            ViewMode::Week => ViewMode::Report,
            ViewMode::Report => ViewMode::Chores,
        };
    }

    /// Initiates the "Add Chore" wizard.
    pub fn start_add(&mut self) {
        if self.view_mode != ViewMode::Chores { return; }
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a field of the selected chore.
    pub fn start_edit(&mut self, field: InputField) {
        if self.view_mode != ViewMode::Chores { return; }
        let Some(t) = self.selected_task() else { return };
        let prefill = match field {
            InputField::Name => t.name.clone(),
            InputField::Every => t.frequency_days.to_string(),
            InputField::None => String::new(),
        };
        self.target_id = Some(t.id.clone());
        self.input_buffer = prefill;
        self.input_field = field;
        self.input_mode = InputMode::Editing;
    }

    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    fn handle_adding_input(&mut self) {
        match self.add_state.step {
            0 => {
                if !self.input_buffer.trim().is_empty() {
                    self.add_state.name = self.input_buffer.trim().to_string();
                    self.add_state.step += 1;
                    self.input_buffer = "3".to_string();
                }
            }
            _ => {
                let Ok(every) = self.input_buffer.trim().parse::<i64>() else {
                    self.message = Some(format!("'{}' is not a number of days.", self.input_buffer));
                    return;
                };
                let name = self.add_state.name.clone();
                let now = self.schedule.now();
                let outcome = NewTask::new(name, every, now)
                    .and_then(|task| self.schedule.add_task(task))
                    .map(|id| format!("Chore added (id = {}).", short_id(&id)));
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                self.settle(outcome);
            }
        }
    }

    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id.take() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        let outcome = self.schedule.find_task(&id).and_then(|mut task| {
            match self.input_field {
                InputField::Name => task.name = self.input_buffer.trim().to_string(),
                InputField::Every => match self.input_buffer.trim().parse::<i64>() {
                    Ok(every) => task.frequency_days = every,
                    Err(_) => return Ok(format!("'{}' is not a number of days.", self.input_buffer)),
                },
                InputField::None => {}
            }
            self.schedule.update_task(&task)?;
            Ok(format!("'{}' updated.", task.name))
        });
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.settle(outcome);
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}

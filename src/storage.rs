//! Persistence collaborators.
//!
//! The scheduling core only talks to the traits below. [`JsonStore`] keeps
//! everything as pretty-printed JSON files in one data directory;
//! [`MemoryStore`] keeps it in memory for embedding and tests.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::{default_users, new_task_id, NewTask, ProjectionSnapshot, RecurringTask, TaskId, User};

/// Source of truth for recurring tasks.
pub trait TaskStore {
    fn list(&self) -> Result<Vec<RecurringTask>, StoreError>;
    fn add(&mut self, task: NewTask) -> Result<TaskId, StoreError>;
    /// Replaces the stored task with the same id. Returns `false` if there is none.
    fn update(&mut self, task: &RecurringTask) -> Result<bool, StoreError>;
    /// Returns `false` if no task had that id.
    fn delete(&mut self, id: &str) -> Result<bool, StoreError>;
}

/// Receives each regenerated occurrence set as a whole.
pub trait OccurrenceSink {
    fn load(&self) -> Result<ProjectionSnapshot, StoreError>;
    fn replace_all(&mut self, snapshot: &ProjectionSnapshot) -> Result<(), StoreError>;
}

/// Read-only view of the household members.
pub trait UserDirectory {
    fn list(&self) -> Vec<User>;

    fn get(&self, id: &str) -> Option<User> {
        self.list().into_iter().find(|u| u.id == id)
    }

    /// Display name for `id`, falling back to the id itself.
    fn display_name(&self, id: &str) -> String {
        self.get(id).map(|u| u.name).unwrap_or_else(|| id.to_string())
    }
}

const TASKS_FILE: &str = "tasks.json";
const EVENTS_FILE: &str = "events.json";
const USERS_FILE: &str = "users.json";

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        JsonStore { dir: dir.into() }
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    /// Loads all tasks for display. A missing or unreadable file yields an
    /// empty list.
    pub fn load_tasks(&self) -> Vec<RecurringTask> {
        read_lenient(&self.tasks_path()).unwrap_or_default()
    }

    /// Loads all tasks, failing on a corrupt file so it is never overwritten.
    fn read_tasks(&self) -> Result<Vec<RecurringTask>, StoreError> {
        Ok(read_json(&self.tasks_path())?.unwrap_or_default())
    }

    pub fn save_tasks(&self, tasks: &[RecurringTask]) -> Result<(), StoreError> {
        write_json(&self.tasks_path(), &tasks)
    }

    pub fn load_snapshot(&self) -> ProjectionSnapshot {
        read_lenient(&self.events_path()).unwrap_or_default()
    }

    pub fn save_snapshot(&self, snapshot: &ProjectionSnapshot) -> Result<(), StoreError> {
        write_json(&self.events_path(), snapshot)
    }

    /// Loads the user registry, or the two default members if none is saved.
    pub fn load_users(&self) -> Vec<User> {
        read_lenient(&self.users_path()).unwrap_or_else(default_users)
    }

    pub fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        write_json(&self.users_path(), &users)
    }

    /// Renames a member. Returns `false` if the id is unknown.
    pub fn rename_user(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        let mut users = read_json(&self.users_path())?.unwrap_or_else(default_users);
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.name = name.trim().to_string();
        self.save_users(&users)?;
        info!(user = id, name, "renamed user");
        Ok(true)
    }

    /// Deletes tasks, occurrences and users.
    pub fn delete_database(&self) -> Result<(), StoreError> {
        for path in [self.tasks_path(), self.events_path(), self.users_path()] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

impl TaskStore for JsonStore {
    fn list(&self) -> Result<Vec<RecurringTask>, StoreError> {
        self.read_tasks()
    }

    fn add(&mut self, task: NewTask) -> Result<TaskId, StoreError> {
        let mut tasks = self.read_tasks()?;
        let id = new_task_id();
        tasks.push(task.into_task(id.clone()));
        self.save_tasks(&tasks)?;
        Ok(id)
    }

    fn update(&mut self, task: &RecurringTask) -> Result<bool, StoreError> {
        let mut tasks = self.read_tasks()?;
        let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(false);
        };
        *slot = task.clone();
        self.save_tasks(&tasks)?;
        Ok(true)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut tasks = self.read_tasks()?;
        let len_before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == len_before {
            return Ok(false);
        }
        self.save_tasks(&tasks)?;
        Ok(true)
    }
}

impl OccurrenceSink for JsonStore {
    fn load(&self) -> Result<ProjectionSnapshot, StoreError> {
        Ok(self.load_snapshot())
    }

    fn replace_all(&mut self, snapshot: &ProjectionSnapshot) -> Result<(), StoreError> {
        self.save_snapshot(snapshot)
    }
}

impl UserDirectory for JsonStore {
    fn list(&self) -> Vec<User> {
        self.load_users()
    }
}

/// Reads a JSON file. A missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let mut f = OpenOptions::new().read(true).open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    Ok(Some(serde_json::from_str(&s)?))
}

/// Like [`read_json`], but an unreadable or corrupt file is logged and read
/// as missing.
fn read_lenient<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match read_json(path) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable data file");
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let s = serde_json::to_string_pretty(value)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// In-memory tasks, occurrences and users.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub tasks: Vec<RecurringTask>,
    pub snapshot: ProjectionSnapshot,
    pub users: Vec<User>,
    /// Number of `replace_all` calls received.
    pub replacements: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tasks: Vec::new(),
            snapshot: ProjectionSnapshot::default(),
            users: default_users(),
            replacements: 0,
        }
    }

    pub fn with_tasks(tasks: Vec<RecurringTask>) -> Self {
        MemoryStore { tasks, ..Self::new() }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for MemoryStore {
    fn list(&self) -> Result<Vec<RecurringTask>, StoreError> {
        Ok(self.tasks.clone())
    }

    fn add(&mut self, task: NewTask) -> Result<TaskId, StoreError> {
        let id = new_task_id();
        self.tasks.push(task.into_task(id.clone()));
        Ok(id)
    }

    fn update(&mut self, task: &RecurringTask) -> Result<bool, StoreError> {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let len_before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        Ok(self.tasks.len() != len_before)
    }
}

impl OccurrenceSink for MemoryStore {
    fn load(&self) -> Result<ProjectionSnapshot, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn replace_all(&mut self, snapshot: &ProjectionSnapshot) -> Result<(), StoreError> {
        self.snapshot = snapshot.clone();
        self.replacements += 1;
        Ok(())
    }
}

impl UserDirectory for MemoryStore {
    fn list(&self) -> Vec<User> {
        self.users.clone()
    }
}

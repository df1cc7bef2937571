//! Task list CRUD.
//!
//! The store knows nothing about experience or badges. `toggle` reports which
//! way a task flipped and leaves the reward decision to the caller.

use crate::error::{TrackerError, TrackerResult};
use crate::types::{Task, Transition, now_ms};
use tracing::debug;
use uuid::Uuid;

/// Ordered task list, most recently added first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded snapshot, keeping its order.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Add a task to the front of the list.
    ///
    /// Text that is empty after trimming is rejected with `InvalidInput`.
    /// The stored text is kept as entered.
    pub fn add(&mut self, text: &str) -> TrackerResult<Task> {
        if text.trim().is_empty() {
            return Err(TrackerError::empty_text());
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
            created_at: now_ms(),
        };
        debug!(task_id = %task.id, "Task added");
        self.tasks.insert(0, task.clone());
        Ok(task)
    }

    /// Flip a task's completion flag.
    ///
    /// Returns `None` for an unknown id, which is not an error.
    pub fn toggle(&mut self, id: &str) -> Option<Transition> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        let transition = if task.completed {
            Transition::Completed
        } else {
            Transition::Reopened
        };
        debug!(task_id = %id, transition = transition.as_str(), "Task toggled");
        Some(transition)
    }

    /// Remove a task. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            debug!(task_id = %id, "Task removed");
        }
        removed
    }

    /// All tasks, most recently added first.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolve a full id or a unique id prefix to a task id.
    pub fn resolve_id(&self, prefix: &str) -> TrackerResult<String> {
        if let Some(task) = self.get(prefix) {
            return Ok(task.id.clone());
        }

        let matches: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| !prefix.is_empty() && t.id.starts_with(prefix))
            .map(|t| t.id.clone())
            .collect();

        match matches.as_slice() {
            [] => Err(TrackerError::task_not_found(prefix)),
            [only] => Ok(only.clone()),
            _ => Err(TrackerError::ambiguous_id(prefix, &matches)),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Copy of the task list for persistence.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }
}

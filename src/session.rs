//! One user's tracker session.
//!
//! Holds the task store and progression engine, turns each user action into
//! an event batch, and mirrors state to storage after every mutation. The
//! in-memory state is authoritative: a failed save is logged and kept as a
//! warning, never rolled back into the action's result.

use crate::error::{TrackerError, TrackerResult};
use crate::events::{EventBatch, RewardEvent};
use crate::persistence::{KeyValueStore, LoadedSnapshot, Persistence};
use crate::progression::{ProgressionEngine, ProgressionState};
use crate::store::TaskStore;
use crate::types::{Task, Transition};
use tracing::{debug, warn};

/// Result of toggling a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// `None` if the id was unknown.
    pub transition: Option<Transition>,
    pub events: EventBatch,
}

/// Tracker state plus its storage.
#[derive(Debug)]
pub struct Session<S> {
    tasks: TaskStore,
    progression: ProgressionEngine,
    persistence: Persistence<S>,
    last_warning: Option<TrackerError>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load state from `store`, falling back to defaults for anything missing.
    pub fn open(store: S) -> Self {
        let persistence = Persistence::new(store);
        let LoadedSnapshot { tasks, progression } = persistence.load();

        let tasks = tasks.map(TaskStore::from_tasks).unwrap_or_default();
        let progression = progression
            .map(ProgressionEngine::from_state)
            .unwrap_or_default();
        debug!(
            tasks = tasks.len(),
            level = progression.state().level,
            "Session opened"
        );

        Self {
            tasks,
            progression,
            persistence,
            last_warning: None,
        }
    }

    /// Add a task. Blank text is rejected and nothing changes.
    pub fn add_task(&mut self, text: &str) -> TrackerResult<(Task, EventBatch)> {
        let task = self.tasks.add(text)?;
        let events = vec![RewardEvent::TaskAdded {
            task_id: task.id.clone(),
        }];
        self.persist();
        Ok((task, events))
    }

    /// Toggle a task. Only a false→true flip is rewarded; reopening keeps XP.
    pub fn toggle_task(&mut self, id: &str) -> ToggleOutcome {
        let transition = self.tasks.toggle(id);
        let events = match transition {
            Some(Transition::Completed) => self.progression.record_completion().events,
            Some(Transition::Reopened) | None => EventBatch::new(),
        };
        if transition.is_some() {
            self.persist();
        }
        ToggleOutcome { transition, events }
    }

    /// Delete a task. Progression is untouched.
    pub fn remove_task(&mut self, id: &str) -> bool {
        let removed = self.tasks.remove(id);
        if removed {
            self.persist();
        }
        removed
    }

    /// Award XP outside of task completion, e.g. a batch of pending rewards.
    pub fn award_xp(&mut self, amount: i64) -> TrackerResult<EventBatch> {
        let outcome = self.progression.award_xp(amount)?;
        self.persist();
        Ok(outcome.events)
    }

    /// Resolve a full id or unique prefix to a task id.
    pub fn resolve_id(&self, prefix: &str) -> TrackerResult<String> {
        self.tasks.resolve_id(prefix)
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn progression(&self) -> &ProgressionState {
        self.progression.state()
    }

    /// Most recent persistence failure, cleared by the next successful save.
    pub fn last_warning(&self) -> Option<&TrackerError> {
        self.last_warning.as_ref()
    }

    /// Write the current state out now.
    pub fn save(&mut self) -> TrackerResult<()> {
        self.persistence
            .save(self.tasks.list(), self.progression.state())
    }

    pub fn storage(&self) -> &S {
        self.persistence.store()
    }

    pub fn into_storage(self) -> S {
        self.persistence.into_inner()
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(()) => self.last_warning = None,
            Err(e) => {
                warn!(error = %e, "Could not save state; continuing in memory");
                self.last_warning = Some(e);
            }
        }
    }
}

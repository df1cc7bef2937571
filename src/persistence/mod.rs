//! Snapshot persistence for the task list and progression state.
//!
//! Two records are stored under fixed keys in a key-value backend:
//! - `todoTasks`: JSON array of tasks, most recent first
//! - `todoStats`: JSON progression record
//!
//! There is no version field. Missing fields load as defaults; a record that
//! fails to parse is treated as absent so callers fall back to a fresh state.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{TrackerError, TrackerResult};
use crate::progression::ProgressionState;
use crate::types::Task;
use anyhow::Result;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Key of the task list record.
pub const TASKS_KEY: &str = "todoTasks";

/// Key of the progression record.
pub const PROGRESSION_KEY: &str = "todoStats";

/// Durable string storage addressed by key.
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace a value. Must either fully succeed or leave the previous value.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }
}

/// What `load` found in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub tasks: Option<Vec<Task>>,
    pub progression: Option<ProgressionState>,
}

/// Reads and writes tracker snapshots through a [`KeyValueStore`].
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Write both snapshots.
    ///
    /// Both payloads are serialized before either record is written, and the
    /// progression record goes first. If the task write then fails, storage
    /// holds rewards for a task still marked open, never a completed task
    /// without its reward.
    pub fn save(&mut self, tasks: &[Task], progression: &ProgressionState) -> TrackerResult<()> {
        let tasks_json =
            serde_json::to_string(tasks).map_err(|e| TrackerError::persistence(TASKS_KEY, e))?;
        let progression_json = serde_json::to_string(progression)
            .map_err(|e| TrackerError::persistence(PROGRESSION_KEY, e))?;

        self.store
            .put(PROGRESSION_KEY, &progression_json)
            .map_err(|e| TrackerError::persistence(PROGRESSION_KEY, format!("{:#}", e)))?;
        self.store
            .put(TASKS_KEY, &tasks_json)
            .map_err(|e| TrackerError::persistence(TASKS_KEY, format!("{:#}", e)))?;

        debug!(tasks = tasks.len(), "Snapshot saved");
        Ok(())
    }

    /// Read both snapshots. Never fails; problems are logged and reported as absent.
    pub fn load(&self) -> LoadedSnapshot {
        LoadedSnapshot {
            tasks: self.load_record(TASKS_KEY),
            progression: self.load_record(PROGRESSION_KEY),
        }
    }

    fn load_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No stored snapshot");
                return None;
            }
            Err(e) => {
                warn!(key, error = %format!("{:#}", e), "Failed to read snapshot, using defaults");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Malformed snapshot, using defaults");
                None
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

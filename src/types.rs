//! Core types shared by the task store, session, and output layers.

use serde::{Deserialize, Serialize};

/// A single completable item in the task list.
///
/// Field names are camelCase on disk so snapshots stay readable by older
/// saves of the same `todoTasks` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

/// Which way a toggle flipped a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Not completed before, completed now. The only rewarded transition.
    Completed,
    /// Completed before, open again. Rewards already granted stay granted.
    Reopened,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Completed => "completed",
            Transition::Reopened => "reopened",
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self, Transition::Completed)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

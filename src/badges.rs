//! Static badge catalog.
//!
//! Badges are never created at runtime; progression state only stores their
//! ids. Milestone tables map a completion count or a level to the badge it
//! unlocks.

use serde::Serialize;

pub const FIRST_TASK: &str = "first_task";
pub const TASKS_10: &str = "tasks_10";
pub const TASKS_25: &str = "tasks_25";
/// The "Energetic" badge.
pub const LEVEL_5: &str = "level_5";
/// The "Master" badge.
pub const LEVEL_10: &str = "level_10";

/// Catalog entry describing a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

impl Badge {
    const fn new(
        id: &'static str,
        icon: &'static str,
        name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            description,
            icon,
        }
    }
}

/// All badges, in catalog order.
pub const CATALOG: &[Badge] = &[
    Badge::new(FIRST_TASK, "🌟", "First Step", "Completed your first task"),
    Badge::new(TASKS_10, "🎯", "Novice", "Completed 10 tasks"),
    Badge::new(TASKS_25, "🏆", "Pro", "Completed 25 tasks"),
    Badge::new(LEVEL_5, "⚡", "Energetic", "Reached level 5"),
    Badge::new(LEVEL_10, "👑", "Master", "Reached level 10"),
];

/// Completion-count milestones: exact `totalCompleted` value → badge id.
pub const COMPLETION_MILESTONES: &[(u64, &str)] = &[(1, FIRST_TASK), (10, TASKS_10), (25, TASKS_25)];

/// Level milestones: exact level reached → badge id.
pub const LEVEL_MILESTONES: &[(u32, &str)] = &[(5, LEVEL_5), (10, LEVEL_10)];

/// Look up a badge by id.
pub fn find(id: &str) -> Option<&'static Badge> {
    CATALOG.iter().find(|b| b.id == id)
}

/// Badge unlocked by reaching exactly `total` completions, if any.
pub fn for_completion_count(total: u64) -> Option<&'static str> {
    COMPLETION_MILESTONES
        .iter()
        .find(|(count, _)| *count == total)
        .map(|(_, id)| *id)
}

/// Badge unlocked by reaching exactly `level`, if any.
pub fn for_level(level: u32) -> Option<&'static str> {
    LEVEL_MILESTONES
        .iter()
        .find(|(lvl, _)| *lvl == level)
        .map(|(_, id)| *id)
}

/// Format a badge unlock as a one-line notification.
pub fn format_unlock(badge: &Badge) -> String {
    format!("{} New badge! {}: {}", badge.icon, badge.name, badge.description)
}

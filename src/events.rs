//! Reward events emitted by tracker operations.
//!
//! Every user action returns its own ordered batch. Nothing is buffered
//! between actions; a presentation layer renders each batch in emission order
//! right after the action returns.

use crate::badges;
use serde::Serialize;

/// A discrete thing that happened during one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardEvent {
    /// A task was added to the list.
    TaskAdded { task_id: String },
    /// Experience was awarded.
    XpGained { amount: u64 },
    /// The level counter advanced to `new_level`.
    LevelUp { new_level: u32 },
    /// A badge was added to the collection for the first time.
    BadgeUnlocked { badge_id: String },
}

/// Ordered events produced by a single action.
pub type EventBatch = Vec<RewardEvent>;

impl RewardEvent {
    /// Stable kind name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            RewardEvent::TaskAdded { .. } => "task_added",
            RewardEvent::XpGained { .. } => "xp_gained",
            RewardEvent::LevelUp { .. } => "level_up",
            RewardEvent::BadgeUnlocked { .. } => "badge_unlocked",
        }
    }

    /// Suggested time a notification for this event stays on screen.
    pub fn display_duration_ms(&self) -> u64 {
        match self {
            RewardEvent::TaskAdded { .. } => 3_000,
            RewardEvent::XpGained { .. } => 2_000,
            RewardEvent::LevelUp { .. } => 4_000,
            RewardEvent::BadgeUnlocked { .. } => 5_000,
        }
    }

    /// Short human-readable line for notifications.
    pub fn headline(&self) -> String {
        match self {
            RewardEvent::TaskAdded { .. } => {
                "✅ Task added. Complete it to earn XP!".to_string()
            }
            RewardEvent::XpGained { amount } => format!("+{} XP 🎮 Nice work!", amount),
            RewardEvent::LevelUp { new_level } => {
                format!("🎊 Level up! You reached level {}!", new_level)
            }
            RewardEvent::BadgeUnlocked { badge_id } => match badges::find(badge_id) {
                Some(badge) => badges::format_unlock(badge),
                None => format!("New badge! {}", badge_id),
            },
        }
    }
}

/// Level numbers reached in a batch, in order.
pub fn levels_reached(batch: &[RewardEvent]) -> Vec<u32> {
    batch
        .iter()
        .filter_map(|e| match e {
            RewardEvent::LevelUp { new_level } => Some(*new_level),
            _ => None,
        })
        .collect()
}

/// Badge ids unlocked in a batch, in order.
pub fn badges_unlocked(batch: &[RewardEvent]) -> Vec<&str> {
    batch
        .iter()
        .filter_map(|e| match e {
            RewardEvent::BadgeUnlocked { badge_id } => Some(badge_id.as_str()),
            _ => None,
        })
        .collect()
}

//! Progression engine: experience, levels, and badge unlocks.
//!
//! All rules live here. An operation works on a copy of the current
//! [`ProgressionState`] and only replaces it once the copy is complete, so a
//! rejected call leaves the state untouched and callers never observe a
//! half-finished rollover.
//!
//! ## Rollover
//! Awarding XP adds to the pool, then while the pool reaches the threshold the
//! threshold is paid out, the level goes up by one, and the next threshold
//! becomes `floor(threshold * 1.5)`. Level badges are checked inside the loop
//! right after each increment, so a jump from level 3 to level 6 still
//! unlocks the level 5 badge exactly once.

use crate::badges;
use crate::error::{TrackerError, TrackerResult};
use crate::events::{EventBatch, RewardEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// XP granted for every task completion.
pub const FIXED_COMPLETION_REWARD: u64 = 20;

/// Threshold between level 1 and level 2.
pub const INITIAL_XP_TO_NEXT_LEVEL: u64 = 100;

/// Persisted progression record (`todoStats`).
///
/// Missing fields load as their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionState {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub total_completed: u64,
    /// Unlocked badge ids in unlock order.
    pub badges: Vec<String>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: INITIAL_XP_TO_NEXT_LEVEL,
            total_completed: 0,
            badges: Vec::new(),
        }
    }
}

/// Threshold for the level after one whose threshold was `current`.
///
/// `current + current / 2` is `floor(current * 1.5)` without floating point.
pub fn next_threshold(current: u64) -> u64 {
    current.saturating_add(current / 2)
}

impl ProgressionState {
    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|b| b == id)
    }

    /// Level shown as the next goal.
    pub fn next_level(&self) -> u32 {
        self.level.saturating_add(1)
    }

    /// Progress towards the next level, 0.0 to 100.0.
    pub fn progress_percent(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        (self.xp as f64 / self.xp_to_next_level as f64) * 100.0
    }

    /// Add a badge if it is not already held. Returns whether it was added.
    fn grant_badge(&mut self, id: &str, events: &mut EventBatch) -> bool {
        if self.has_badge(id) {
            return false;
        }
        self.badges.push(id.to_string());
        info!(badge = %id, "Badge unlocked");
        events.push(RewardEvent::BadgeUnlocked {
            badge_id: id.to_string(),
        });
        true
    }

    /// Pay out thresholds until `xp` is below the current one.
    fn roll_over(&mut self, events: &mut EventBatch) {
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level = self.level.saturating_add(1);
            self.xp_to_next_level = next_threshold(self.xp_to_next_level);
            info!(
                level = self.level,
                xp_to_next_level = self.xp_to_next_level,
                "Level up"
            );
            events.push(RewardEvent::LevelUp {
                new_level: self.level,
            });

            if let Some(badge) = badges::for_level(self.level) {
                self.grant_badge(badge, events);
            }
        }
    }

    fn add_xp(&mut self, amount: u64, events: &mut EventBatch) {
        debug!(amount, xp = self.xp, "Awarding XP");
        events.push(RewardEvent::XpGained { amount });
        self.xp = self.xp.saturating_add(amount);
        self.roll_over(events);
    }

    /// Repair a state read from storage.
    ///
    /// Storage is not trusted: a level below 1 or a zero threshold is reset,
    /// duplicate badge ids are dropped (keeping first occurrence), and an
    /// overfull XP pool is rolled over without events. Level badges it
    /// reaches are kept.
    pub fn normalized(mut self) -> Self {
        if self.level < 1 {
            warn!(level = self.level, "Stored level below 1, resetting");
            self.level = 1;
        }
        if self.xp_to_next_level < 1 {
            warn!("Stored XP threshold is zero, resetting");
            self.xp_to_next_level = INITIAL_XP_TO_NEXT_LEVEL;
        }

        let mut seen = Vec::with_capacity(self.badges.len());
        self.badges.retain(|b| {
            if seen.contains(b) {
                false
            } else {
                seen.push(b.clone());
                true
            }
        });

        if self.xp >= self.xp_to_next_level {
            warn!(
                xp = self.xp,
                xp_to_next_level = self.xp_to_next_level,
                "Stored XP exceeds threshold, rolling over"
            );
            self.settle_stored_xp();
        }
        self
    }

    /// Roll over a stored XP pool without producing events.
    ///
    /// Thresholds grow geometrically, so the loop is short unless the
    /// threshold cannot grow (`next_threshold(1) == 1`). That case is settled
    /// by division. Level badges for every level passed are still granted.
    fn settle_stored_xp(&mut self) {
        while self.xp >= self.xp_to_next_level {
            let threshold = self.xp_to_next_level;
            let from = self.level;
            if next_threshold(threshold) == threshold {
                let levels = u32::try_from(self.xp / threshold).unwrap_or(u32::MAX);
                self.xp %= threshold;
                self.level = self.level.saturating_add(levels);
            } else {
                self.xp -= threshold;
                self.level = self.level.saturating_add(1);
                self.xp_to_next_level = next_threshold(threshold);
            }
            for (milestone, badge) in badges::LEVEL_MILESTONES {
                if *milestone > from && *milestone <= self.level && !self.has_badge(badge) {
                    self.badges.push(badge.to_string());
                }
            }
        }
    }
}

/// Result of an XP award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelOutcome {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub events: EventBatch,
}

/// Result of recording a task completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionOutcome {
    pub total_completed: u64,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    /// Completion badges first, then the XP award's events.
    pub events: EventBatch,
}

/// Owner of the progression state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionEngine {
    state: ProgressionState,
}

impl ProgressionEngine {
    /// Create an engine with default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from a stored state, normalizing it first.
    pub fn from_state(state: ProgressionState) -> Self {
        Self {
            state: state.normalized(),
        }
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn into_state(self) -> ProgressionState {
        self.state
    }

    /// Award `amount` XP, rolling over as many levels as it covers.
    ///
    /// Fails with `InvalidAmount` for `amount <= 0`; the state is unchanged.
    pub fn award_xp(&mut self, amount: i64) -> TrackerResult<LevelOutcome> {
        let amount = u64::try_from(amount)
            .ok()
            .filter(|a| *a > 0)
            .ok_or_else(|| TrackerError::invalid_amount(amount))?;

        let mut next = self.state.clone();
        let mut events = EventBatch::new();
        next.add_xp(amount, &mut events);
        self.state = next;

        Ok(LevelOutcome {
            level: self.state.level,
            xp: self.state.xp,
            xp_to_next_level: self.state.xp_to_next_level,
            events,
        })
    }

    /// Record one task's false→true transition.
    ///
    /// Must be called exactly once per such transition and never for a task
    /// being reopened.
    pub fn record_completion(&mut self) -> CompletionOutcome {
        let mut next = self.state.clone();
        let mut events = EventBatch::new();

        next.total_completed = next.total_completed.saturating_add(1);
        debug!(total_completed = next.total_completed, "Recording completion");
        if let Some(badge) = badges::for_completion_count(next.total_completed) {
            next.grant_badge(badge, &mut events);
        }

        next.add_xp(FIXED_COMPLETION_REWARD, &mut events);
        self.state = next;

        CompletionOutcome {
            total_completed: self.state.total_completed,
            level: self.state.level,
            xp: self.state.xp,
            xp_to_next_level: self.state.xp_to_next_level,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn engine_with(level: u32, xp: u64, xp_to_next_level: u64) -> ProgressionEngine {
        ProgressionEngine::from_state(ProgressionState {
            level,
            xp,
            xp_to_next_level,
            ..Default::default()
        })
    }

    #[test]
    fn test_defaults() {
        let state = ProgressionState::default();
        assert_eq!(state.level, 1);
        assert_eq!(state.xp, 0);
        assert_eq!(state.xp_to_next_level, 100);
        assert_eq!(state.total_completed, 0);
        assert!(state.badges.is_empty());
    }

    #[test]
    fn test_next_threshold_floors() {
        assert_eq!(next_threshold(100), 150);
        assert_eq!(next_threshold(150), 225);
        assert_eq!(next_threshold(225), 337);
        assert_eq!(next_threshold(337), 505);
        assert_eq!(next_threshold(1), 1);
        assert_eq!(next_threshold(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_award_below_threshold() {
        let mut engine = ProgressionEngine::new();
        let outcome = engine.award_xp(20).unwrap();
        assert_eq!(outcome.level, 1);
        assert_eq!(outcome.xp, 20);
        assert_eq!(outcome.events, vec![RewardEvent::XpGained { amount: 20 }]);
    }

    #[test]
    fn test_award_exactly_threshold_levels_up_to_zero() {
        let mut engine = engine_with(1, 80, 100);
        let outcome = engine.award_xp(20).unwrap();
        assert_eq!(outcome.level, 2);
        assert_eq!(outcome.xp, 0);
        assert_eq!(outcome.xp_to_next_level, 150);
    }

    #[test]
    fn test_multi_level_rollover() {
        let mut engine = engine_with(1, 90, 100);
        let outcome = engine.award_xp(250).unwrap();

        assert_eq!(outcome.level, 3);
        assert_eq!(outcome.xp, 90);
        assert_eq!(outcome.xp_to_next_level, 225);
        assert_eq!(
            outcome.events,
            vec![
                RewardEvent::XpGained { amount: 250 },
                RewardEvent::LevelUp { new_level: 2 },
                RewardEvent::LevelUp { new_level: 3 },
            ]
        );
    }

    #[test]
    fn test_level_badge_fires_inside_loop() {
        // 3 -> 6 in a single award; level 5 badge sits between LevelUp(5) and LevelUp(6).
        let mut engine = engine_with(3, 0, 100);
        let outcome = engine.award_xp(100 + 150 + 225).unwrap();

        assert_eq!(outcome.level, 6);
        assert_eq!(
            outcome.events,
            vec![
                RewardEvent::XpGained { amount: 475 },
                RewardEvent::LevelUp { new_level: 4 },
                RewardEvent::LevelUp { new_level: 5 },
                RewardEvent::BadgeUnlocked {
                    badge_id: badges::LEVEL_5.to_string()
                },
                RewardEvent::LevelUp { new_level: 6 },
            ]
        );
        assert_eq!(engine.state().badges, vec![badges::LEVEL_5.to_string()]);
    }

    #[test]
    fn test_level_badge_not_repeated() {
        let mut engine = engine_with(4, 0, 100);
        let first = engine.award_xp(100).unwrap();
        assert_eq!(crate::events::badges_unlocked(&first.events), vec![badges::LEVEL_5]);

        let later = engine.award_xp(10_000).unwrap();
        assert!(!crate::events::badges_unlocked(&later.events).contains(&badges::LEVEL_5));
        assert_eq!(
            engine.state().badges.iter().filter(|b| *b == badges::LEVEL_5).count(),
            1
        );
    }

    #[test]
    fn test_held_level_badge_is_not_reemitted() {
        let mut engine = ProgressionEngine::from_state(ProgressionState {
            level: 4,
            badges: vec![badges::LEVEL_5.to_string()],
            ..Default::default()
        });
        let outcome = engine.award_xp(100).unwrap();
        assert!(crate::events::badges_unlocked(&outcome.events).is_empty());
    }

    #[test]
    fn test_invalid_amount_leaves_state_untouched() {
        let mut engine = engine_with(2, 40, 150);
        let before = engine.clone();

        for amount in [0, -1, i64::MIN] {
            let err = engine.award_xp(amount).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidAmount);
        }
        assert_eq!(engine, before);
    }

    #[test]
    fn test_first_completion() {
        let mut engine = ProgressionEngine::new();
        let outcome = engine.record_completion();

        assert_eq!(outcome.total_completed, 1);
        assert_eq!(outcome.xp, 20);
        assert_eq!(
            outcome.events,
            vec![
                RewardEvent::BadgeUnlocked {
                    badge_id: badges::FIRST_TASK.to_string()
                },
                RewardEvent::XpGained { amount: 20 },
            ]
        );
    }

    #[test]
    fn test_completion_badge_precedes_level_up() {
        // Ninth completion already recorded, tenth crosses the level threshold too.
        let mut engine = ProgressionEngine::from_state(ProgressionState {
            level: 1,
            xp: 80,
            xp_to_next_level: 100,
            total_completed: 9,
            badges: vec![badges::FIRST_TASK.to_string()],
        });
        let outcome = engine.record_completion();

        assert_eq!(
            outcome.events,
            vec![
                RewardEvent::BadgeUnlocked {
                    badge_id: badges::TASKS_10.to_string()
                },
                RewardEvent::XpGained { amount: 20 },
                RewardEvent::LevelUp { new_level: 2 },
            ]
        );
        assert_eq!(outcome.total_completed, 10);
        assert_eq!(outcome.level, 2);
    }

    #[test]
    fn test_twenty_five_completions() {
        let mut engine = ProgressionEngine::new();
        let mut unlocked = Vec::new();
        for _ in 0..25 {
            let outcome = engine.record_completion();
            unlocked.extend(
                crate::events::badges_unlocked(&outcome.events)
                    .into_iter()
                    .map(str::to_string),
            );
        }

        // 500 XP total: thresholds 100, 150 and 225 are paid out, 25 remains.
        let state = engine.state();
        assert_eq!(state.total_completed, 25);
        assert_eq!(state.level, 4);
        assert_eq!(state.xp, 25);
        assert_eq!(state.xp_to_next_level, 337);
        assert_eq!(
            unlocked,
            vec![
                badges::FIRST_TASK.to_string(),
                badges::TASKS_10.to_string(),
                badges::TASKS_25.to_string(),
            ]
        );
    }

    #[test]
    fn test_normalize_rolls_over_overfull_pool() {
        let engine = engine_with(4, 120, 100);
        let state = engine.state();
        assert_eq!(state.level, 5);
        assert_eq!(state.xp, 20);
        assert_eq!(state.xp_to_next_level, 150);
        assert!(state.has_badge(badges::LEVEL_5));
    }

    #[test]
    fn test_normalize_settles_unit_threshold_without_looping() {
        let state = ProgressionState {
            level: 1,
            xp: u64::MAX,
            xp_to_next_level: 1,
            total_completed: 0,
            badges: Vec::new(),
        }
        .normalized();

        assert_eq!(state.level, u32::MAX);
        assert_eq!(state.xp, 0);
        assert_eq!(state.xp_to_next_level, 1);
        assert_eq!(state.badges, vec![badges::LEVEL_5, badges::LEVEL_10]);
    }

    #[test]
    fn test_normalize_unit_threshold_counts_levels() {
        let state = ProgressionState {
            level: 2,
            xp: 7,
            xp_to_next_level: 1,
            total_completed: 0,
            badges: Vec::new(),
        }
        .normalized();

        assert_eq!(state.level, 9);
        assert_eq!(state.xp, 0);
        assert_eq!(state.badges, vec![badges::LEVEL_5]);
    }

    #[test]
    fn test_normalize_repairs_bad_fields() {
        let state = ProgressionState {
            level: 0,
            xp: 5,
            xp_to_next_level: 0,
            total_completed: 3,
            badges: vec![
                "first_task".to_string(),
                "first_task".to_string(),
                "streak_7".to_string(),
            ],
        }
        .normalized();

        assert_eq!(state.level, 1);
        assert_eq!(state.xp, 5);
        assert_eq!(state.xp_to_next_level, 100);
        assert_eq!(state.badges, vec!["first_task", "streak_7"]);
    }

    #[test]
    fn test_progress_percent() {
        let state = ProgressionState {
            xp: 45,
            xp_to_next_level: 150,
            ..Default::default()
        };
        assert!((state.progress_percent() - 30.0).abs() < f64::EPSILON);
        assert_eq!(state.next_level(), 2);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_value(ProgressionState::default()).unwrap();
        assert_eq!(json["xpToNextLevel"], 100);
        assert_eq!(json["totalCompleted"], 0);
    }

    #[test]
    fn test_state_missing_fields_default() {
        let state: ProgressionState = serde_json::from_str(r#"{"level": 3, "xp": 10}"#).unwrap();
        assert_eq!(state.level, 3);
        assert_eq!(state.xp_to_next_level, 100);
        assert!(state.badges.is_empty());
    }
}

//! Output formatting for the command line.

use crate::badges;
use crate::config::DisplayConfig;
use crate::events::RewardEvent;
use crate::progression::{FIXED_COMPLETION_REWARD, ProgressionState};
use crate::types::Task;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Output format for command results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// One JSON document per command
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Number of id characters shown in lists and accepted as a short id.
pub const SHORT_ID_LEN: usize = 8;

/// Leading characters of an id for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Format the task list, most recent first.
pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "📝 No tasks yet. Add your first one and start leveling up!\n".to_string();
    }

    let mut out = format!("# Tasks ({})\n\n", tasks.len());
    for task in tasks {
        out.push_str(&format_task_line(task));
    }
    out
}

/// One list line for a task.
pub fn format_task_line(task: &Task) -> String {
    let (mark, reward) = if task.completed {
        ("[x]", format!("  +{} XP", FIXED_COMPLETION_REWARD))
    } else {
        ("[ ]", String::new())
    };
    format!("- {} {} `{}`{}\n", mark, task.text, short_id(&task.id), reward)
}

/// Level, XP and completion summary.
pub fn format_stats(state: &ProgressionState, display: &DisplayConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "🎮 LVL {} · {} tasks completed\n",
        state.level, state.total_completed
    ));
    out.push_str(&format!(
        "Progress to level {}: {} / {} XP\n",
        state.next_level(),
        state.xp,
        state.xp_to_next_level
    ));
    if display.show_progress_bar {
        let percent = state.progress_percent();
        out.push_str(&format!(
            "{} {:.0}%\n",
            progress_bar(percent, display.bar_width),
            percent
        ));
    }
    if !state.badges.is_empty() {
        out.push_str(&format!("Badges: {}\n", badge_icons(&state.badges)));
    }
    out
}

/// Fixed-width text progress bar for a 0-100 percentage.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).floor() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn badge_icons(held: &[String]) -> String {
    held.iter()
        .map(|id| match badges::find(id) {
            Some(badge) => format!("{} {}", badge.icon, badge.name),
            None => id.clone(),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Full badge catalog with unlock status, followed by any held ids the
/// catalog does not know.
pub fn format_badges(held: &[String]) -> String {
    let unlocked = badges::CATALOG
        .iter()
        .filter(|b| held.iter().any(|h| h == b.id))
        .count();
    let mut out = format!("# Badges ({}/{})\n\n", unlocked, badges::CATALOG.len());

    for badge in badges::CATALOG {
        let mark = if held.iter().any(|h| h == badge.id) {
            "[x]"
        } else {
            "[ ]"
        };
        out.push_str(&format!(
            "- {} {} {} - {}\n",
            mark, badge.icon, badge.name, badge.description
        ));
    }
    for id in held.iter().filter(|h| badges::find(h).is_none()) {
        out.push_str(&format!("- [x] {}\n", id));
    }
    out
}

/// Event batch as notification lines, in emission order.
pub fn format_events(events: &[RewardEvent]) -> String {
    events
        .iter()
        .map(|e| format!("{}\n", e.headline()))
        .collect()
}

/// Event batch as JSON, each event carrying its headline and how long a
/// notification for it should stay visible.
pub fn events_json(events: &[RewardEvent]) -> Value {
    let entries: Vec<Value> = events
        .iter()
        .map(|event| {
            let mut entry = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
            if let Value::Object(map) = &mut entry {
                map.insert("headline".to_string(), json!(event.headline()));
                map.insert(
                    "display_ms".to_string(),
                    json!(event.display_duration_ms()),
                );
            }
            entry
        })
        .collect();
    Value::Array(entries)
}

/// Progression state plus derived display values as JSON.
pub fn stats_json(state: &ProgressionState) -> Value {
    json!({
        "level": state.level,
        "xp": state.xp,
        "xpToNextLevel": state.xp_to_next_level,
        "totalCompleted": state.total_completed,
        "badges": state.badges,
        "nextLevel": state.next_level(),
        "progressPercent": state.progress_percent(),
    })
}

/// Badge catalog with unlock flags as JSON.
pub fn badges_json(held: &[String]) -> Value {
    let catalog: Vec<Value> = badges::CATALOG
        .iter()
        .map(|b| {
            json!({
                "id": b.id,
                "name": b.name,
                "description": b.description,
                "icon": b.icon,
                "unlocked": held.iter().any(|h| h == b.id),
            })
        })
        .collect();
    let unknown: Vec<&String> = held.iter().filter(|h| badges::find(h).is_none()).collect();
    json!({ "badges": catalog, "other": unknown })
}

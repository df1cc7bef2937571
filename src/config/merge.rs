//! Folding config tiers into one document.
//!
//! A tier only has to mention the settings it changes: sections such as
//! `storage` and `display` merge key by key, while any other value the tier
//! gives replaces what lower tiers said. `null` leaves the lower value alone.

use serde_json::Value;

/// Apply one higher-priority tier on top of `target` in place.
///
/// # Example
/// ```
/// use serde_json::json;
/// use task_quest::config::merge_tier;
///
/// let mut config = json!({ "display": { "format": "text", "bar_width": 20 } });
/// merge_tier(&mut config, json!({ "display": { "format": "json" } }));
/// assert_eq!(config, json!({ "display": { "format": "json", "bar_width": 20 } }));
/// ```
pub fn merge_tier(target: &mut Value, tier: Value) {
    match (target, tier) {
        (_, Value::Null) => {}
        (Value::Object(settings), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match settings.get_mut(&key) {
                    Some(current) => merge_tier(current, value),
                    None => {
                        settings.insert(key, value);
                    }
                }
            }
        }
        (target, tier) => *target = tier,
    }
}

/// Merge tiers given lowest priority first.
pub fn merge_tiers(tiers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for tier in tiers {
        merge_tier(&mut merged, tier);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Value {
        json!({
            "storage": {"backend": "file", "data_dir": null},
            "display": {"format": "text", "show_progress_bar": true, "bar_width": 20}
        })
    }

    #[test]
    fn test_user_data_dir_keeps_other_storage_defaults() {
        let mut config = defaults();
        merge_tier(&mut config, json!({"storage": {"data_dir": "/srv/quests"}}));

        assert_eq!(config["storage"]["backend"], "file");
        assert_eq!(config["storage"]["data_dir"], "/srv/quests");
        assert_eq!(config["display"], defaults()["display"]);
    }

    #[test]
    fn test_blank_setting_keeps_lower_tier() {
        let mut config = defaults();
        // `bar_width:` with no value in YAML parses as null.
        merge_tier(&mut config, json!({"display": {"bar_width": null}}));
        assert_eq!(config, defaults());
    }

    #[test]
    fn test_empty_tier_file_changes_nothing() {
        let mut config = defaults();
        merge_tier(&mut config, Value::Null);
        assert_eq!(config, defaults());
    }

    #[test]
    fn test_section_given_as_scalar_replaces_section() {
        let mut config = defaults();
        merge_tier(&mut config, json!({"storage": "memory"}));
        assert_eq!(config["storage"], "memory");

        merge_tier(&mut config, json!({"storage": {"backend": "memory"}}));
        assert_eq!(config["storage"], json!({"backend": "memory"}));
    }

    #[test]
    fn test_tiers_apply_in_priority_order() {
        let merged = merge_tiers(vec![
            defaults(),
            json!({"display": {"format": "json", "bar_width": 30}}),
            json!({"display": {"bar_width": 10}, "storage": {"backend": "memory"}}),
        ]);

        assert_eq!(merged["display"]["format"], "json");
        assert_eq!(merged["display"]["bar_width"], 10);
        assert_eq!(merged["display"]["show_progress_bar"], true);
        assert_eq!(merged["storage"]["backend"], "memory");
    }

    #[test]
    fn test_no_tiers_is_null() {
        assert_eq!(merge_tiers(Vec::new()), Value::Null);
    }
}

use crate::cluster::ConfigSnapshot;
use crate::config::RetentionTargets;

pub const RETENTION_MS: &str = "retention.ms";
pub const DELETE_RETENTION_MS: &str = "delete.retention.ms";

/// Whether `current` is above `target`.
///
/// Both sides are parsed as base-10 `i64`. An empty `current` (setting
/// absent) or a value that fails to parse never triggers an update.
pub fn exceeds_target(current: &str, target: &str) -> bool {
    if current.is_empty() {
        return false;
    }
    match (current.parse::<i64>(), target.parse::<i64>()) {
        (Ok(current_ms), Ok(target_ms)) => current_ms > target_ms,
        _ => {
            tracing::error!(current, target, "failed to parse retention values");
            false
        }
    }
}

/// One tracked setting of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingPlan {
    pub key: &'static str,
    pub current: String,
    /// Value to write: the target when changed, otherwise `current`.
    pub value: String,
    pub changed: bool,
}

/// Planned values for `retention.ms` and `delete.retention.ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    settings: [SettingPlan; 2],
}

impl RetentionPlan {
    pub fn settings(&self) -> &[SettingPlan] {
        &self.settings
    }

    pub fn is_changed(&self) -> bool {
        self.settings.iter().any(|s| s.changed)
    }

    /// Final value of `key`, empty if the key is not tracked or absent.
    pub fn value(&self, key: &str) -> &str {
        self.settings
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
            .unwrap_or("")
    }

    /// Key/value pairs for a non-incremental alter.
    ///
    /// Unchanged keys are included with their current value so the write
    /// does not reset them; keys absent from the topic are left out.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.settings
            .iter()
            .filter(|s| !s.value.is_empty())
            .map(|s| (s.key.to_string(), s.value.clone()))
            .collect()
    }
}

/// Compare a topic's snapshot against the targets.
pub fn plan(snapshot: &ConfigSnapshot, targets: &RetentionTargets) -> RetentionPlan {
    let setting = |key: &'static str, target: &str| {
        let current = snapshot.get(key).cloned().unwrap_or_default();
        if exceeds_target(&current, target) {
            tracing::info!(
                setting = key,
                current = %current,
                target,
                "need to update {key}: {current} > {target}"
            );
            SettingPlan {
                key,
                value: target.to_string(),
                current,
                changed: true,
            }
        } else {
            SettingPlan {
                key,
                value: current.clone(),
                current,
                changed: false,
            }
        }
    };

    RetentionPlan {
        settings: [
            setting(RETENTION_MS, &targets.retention_ms),
            setting(DELETE_RETENTION_MS, &targets.delete_retention_ms),
        ],
    }
}

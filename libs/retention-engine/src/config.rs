// ═══════════════════════════════════════════════════════════════
//  Environment variables
// ═══════════════════════════════════════════════════════════════

pub const KAFKA_IP: &str = "KAFKA_IP";
pub const KAFKA_PORT: &str = "KAFKA_PORT";
pub const RETENTION_MS: &str = "RETENTION_MS";
pub const DELETE_RETENTION_MS: &str = "DELETE_RETENTION_MS";
pub const TOPICS: &str = "TOPICS";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_KAFKA_IP: &str = "localhost";
const DEFAULT_KAFKA_PORT: &str = "9092";
/// ~30 minutes.
const DEFAULT_RETENTION_MS: &str = "1900000";
const DEFAULT_DELETE_RETENTION_MS: &str = "1900000";

// ═══════════════════════════════════════════════════════════════
//  Settings
// ═══════════════════════════════════════════════════════════════

/// Desired upper bounds for the two tracked topic settings.
///
/// Kept as the raw strings from the environment: a malformed value is not
/// rejected here, it makes every comparison against it report "no change".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionTargets {
    pub retention_ms: String,
    pub delete_retention_ms: String,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct TelegramSettings {
    pub token: String,
    pub chat_id: String,
}

impl TelegramSettings {
    /// Both credentials present.
    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.token.is_empty() { "" } else { "***" };
        f.debug_struct("TelegramSettings")
            .field("token", &token)
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Run configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub kafka_ip: String,
    pub kafka_port: String,
    pub targets: RetentionTargets,
    /// Explicit topic list. `None` means every topic in the cluster.
    pub topics: Option<Vec<String>>,
    pub telegram: TelegramSettings,
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        // Non-UTF-8 values still count as set.
        Self::from_lookup(|key| std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    /// Load through an arbitrary variable lookup.
    ///
    /// A variable that is set but empty counts as present.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| match lookup(key) {
            Some(value) => value,
            None => {
                tracing::info!(
                    variable = key,
                    default,
                    "couldn't find external var {key}, using {default:?} by default"
                );
                default.to_string()
            }
        };

        Self {
            kafka_ip: var(KAFKA_IP, DEFAULT_KAFKA_IP),
            kafka_port: var(KAFKA_PORT, DEFAULT_KAFKA_PORT),
            targets: RetentionTargets {
                retention_ms: var(RETENTION_MS, DEFAULT_RETENTION_MS),
                delete_retention_ms: var(DELETE_RETENTION_MS, DEFAULT_DELETE_RETENTION_MS),
            },
            topics: topic_override(&var(TOPICS, "")),
            telegram: TelegramSettings {
                token: var(TELEGRAM_TOKEN, ""),
                chat_id: var(TELEGRAM_CHAT_ID, ""),
            },
        }
    }

    /// `host:port` for `bootstrap.servers`.
    pub fn bootstrap_servers(&self) -> String {
        format!("{}:{}", self.kafka_ip, self.kafka_port)
    }
}

/// Parse a comma-separated topic override.
///
/// Only an empty string selects all topics (`None`). Any other value is an
/// explicit list: entries are trimmed and entries that are empty after
/// trimming are dropped, so a blank-looking value yields an empty list.
pub fn parse_topic_list(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
    )
}

fn topic_override(raw: &str) -> Option<Vec<String>> {
    let topics = parse_topic_list(raw);
    if topics.as_ref().is_some_and(Vec::is_empty) {
        tracing::warn!(value = raw, "{TOPICS} is set but names no topics, nothing will be checked");
    }
    topics
}

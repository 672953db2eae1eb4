#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("failed to create Kafka client: {0}")]
    Connect(String),

    #[error("failed to create Kafka admin client: {0}")]
    Admin(String),

    #[error("failed to get topics list: {0}")]
    ListTopics(String),

    #[error("failed to describe config for topic '{topic}': {detail}")]
    Describe { topic: String, detail: String },

    #[error("failed to update configs for topic '{topic}': {detail}")]
    Alter { topic: String, detail: String },
}

impl ClusterError {
    /// Whether the error stops the whole run.
    ///
    /// Connection, admin-session and enumeration failures leave nothing to
    /// work on. Describe/alter failures only affect a single topic.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClusterError::Connect(_) | ClusterError::Admin(_) | ClusterError::ListTopics(_)
        )
    }

    pub(crate) fn describe(topic: &str, detail: impl std::fmt::Display) -> Self {
        ClusterError::Describe {
            topic: topic.to_string(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn alter(topic: &str, detail: impl std::fmt::Display) -> Self {
        ClusterError::Alter {
            topic: topic.to_string(),
            detail: detail.to_string(),
        }
    }
}

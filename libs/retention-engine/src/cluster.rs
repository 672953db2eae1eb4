use std::collections::HashMap;
use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, AlterConfig, ResourceSpecifier};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};

use crate::BoxFuture;
use crate::error::ClusterError;

/// Config entry name → value for one topic, from a single describe call.
pub type ConfigSnapshot = HashMap<String, String>;

/// Broker protocol version assumed when the broker can't be asked.
const BROKER_VERSION: &str = "3.1.0";

/// `rdkafka` requires an explicit timeout for metadata requests.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
//  ClusterAdmin — the operations the topic pass needs
// ═══════════════════════════════════════════════════════════════

pub trait ClusterAdmin: Send + Sync {
    /// All topic names, in the order the cluster reports them.
    fn list_topics(&self) -> BoxFuture<'_, Result<Vec<String>, ClusterError>>;

    /// Current configuration of a topic.
    fn describe_topic<'a>(
        &'a self,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<ConfigSnapshot, ClusterError>>;

    /// Non-incremental config write of `entries` for a topic.
    fn alter_topic<'a>(
        &'a self,
        topic: &'a str,
        entries: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<(), ClusterError>>;
}

impl<T: ClusterAdmin + ?Sized> ClusterAdmin for &T {
    fn list_topics(&self) -> BoxFuture<'_, Result<Vec<String>, ClusterError>> {
        (**self).list_topics()
    }

    fn describe_topic<'a>(
        &'a self,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<ConfigSnapshot, ClusterError>> {
        (**self).describe_topic(topic)
    }

    fn alter_topic<'a>(
        &'a self,
        topic: &'a str,
        entries: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<(), ClusterError>> {
        (**self).alter_topic(topic, entries)
    }
}

// ═══════════════════════════════════════════════════════════════
//  KafkaCluster
// ═══════════════════════════════════════════════════════════════

/// Metadata client + admin session against one cluster.
///
/// Both handles close their broker connections on drop.
pub struct KafkaCluster {
    client: BaseConsumer,
    admin: AdminClient<DefaultClientContext>,
}

impl KafkaCluster {
    /// Open the metadata client, probe the broker, then open the admin session.
    pub fn connect(bootstrap_servers: &str) -> Result<Self, ClusterError> {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("api.version.request", "true")
            .set("broker.version.fallback", BROKER_VERSION);

        let client: BaseConsumer = config
            .create()
            .map_err(|e| ClusterError::Connect(e.to_string()))?;
        let metadata = client
            .fetch_metadata(None, METADATA_TIMEOUT)
            .map_err(|e| ClusterError::Connect(e.to_string()))?;
        tracing::info!(
            bootstrap = bootstrap_servers,
            brokers = metadata.brokers().len(),
            "connected to Kafka"
        );

        // `client` is dropped here on failure, closing its connection.
        let admin: AdminClient<DefaultClientContext> = config
            .create()
            .map_err(|e| ClusterError::Admin(e.to_string()))?;

        Ok(Self { client, admin })
    }
}

impl ClusterAdmin for KafkaCluster {
    fn list_topics(&self) -> BoxFuture<'_, Result<Vec<String>, ClusterError>> {
        Box::pin(async move {
            // Blocking call; the pass runs on a single thread with nothing else to do.
            let metadata = self
                .client
                .fetch_metadata(None, METADATA_TIMEOUT)
                .map_err(|e| ClusterError::ListTopics(e.to_string()))?;
            Ok(metadata
                .topics()
                .iter()
                .map(|t| t.name().to_string())
                .collect())
        })
    }

    fn describe_topic<'a>(
        &'a self,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<ConfigSnapshot, ClusterError>> {
        Box::pin(async move {
            let resource = ResourceSpecifier::Topic(topic);
            let results = self
                .admin
                .describe_configs([&resource], &AdminOptions::new())
                .await
                .map_err(|e| ClusterError::describe(topic, e))?;

            let resource = results
                .into_iter()
                .next()
                .ok_or_else(|| ClusterError::describe(topic, "empty response"))?
                .map_err(|code| ClusterError::describe(topic, code))?;

            Ok(resource
                .entries
                .into_iter()
                .filter_map(|entry| entry.value.map(|value| (entry.name, value)))
                .collect())
        })
    }

    fn alter_topic<'a>(
        &'a self,
        topic: &'a str,
        entries: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<(), ClusterError>> {
        Box::pin(async move {
            let alter = entries.iter().fold(
                AlterConfig::new(ResourceSpecifier::Topic(topic)),
                |alter, (key, value)| alter.set(key, value),
            );
            let results = self
                .admin
                .alter_configs([&alter], &AdminOptions::new())
                .await
                .map_err(|e| ClusterError::alter(topic, e))?;

            match results.into_iter().next() {
                Some(Ok(_)) => Ok(()),
                Some(Err((_, code))) => Err(ClusterError::alter(topic, code)),
                None => Err(ClusterError::alter(topic, "empty response")),
            }
        })
    }
}

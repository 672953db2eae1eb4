use crate::cluster::ClusterAdmin;
use crate::config::{RetentionTargets, Settings};
use crate::error::ClusterError;
use crate::notify::{Notifier, report_failure};
use crate::policy::{self, DELETE_RETENTION_MS, RETENTION_MS};

/// Result of evaluating one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// Nothing above target; no write issued.
    Unchanged,
    /// Config written with the given entries.
    Updated(Vec<(String, String)>),
    /// Describe or alter failed; already logged and notified.
    Failed,
}

/// Counters for one pass over the topics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub checked: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl PassReport {
    fn record(&mut self, outcome: &TopicOutcome) {
        self.checked += 1;
        match outcome {
            TopicOutcome::Unchanged => self.unchanged += 1,
            TopicOutcome::Updated(_) => self.updated += 1,
            TopicOutcome::Failed => self.failed += 1,
        }
    }
}

/// Topics to evaluate: the explicit override, else everything in the cluster.
pub async fn enumerate_topics(
    cluster: &dyn ClusterAdmin,
    settings: &Settings,
) -> Result<Vec<String>, ClusterError> {
    match &settings.topics {
        Some(topics) => Ok(topics.clone()),
        None => cluster.list_topics().await,
    }
}

/// Check one topic and lower its retention settings if they exceed the targets.
///
/// Failures are logged and notified here and never propagate.
pub async fn evaluate_topic(
    cluster: &dyn ClusterAdmin,
    notifier: &dyn Notifier,
    topic: &str,
    targets: &RetentionTargets,
) -> TopicOutcome {
    tracing::info!(topic, "checking retention and delete.retention settings for topic {topic}");

    let snapshot = match cluster.describe_topic(topic).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            report_failure(notifier, &e.to_string()).await;
            return TopicOutcome::Failed;
        }
    };

    let plan = policy::plan(&snapshot, targets);
    if !plan.is_changed() {
        tracing::info!(
            topic,
            retention_ms = plan.value(RETENTION_MS),
            delete_retention_ms = plan.value(DELETE_RETENTION_MS),
            "no updates needed for topic {topic}"
        );
        return TopicOutcome::Unchanged;
    }

    let entries = plan.entries();
    match cluster.alter_topic(topic, &entries).await {
        Ok(()) => {
            tracing::info!(
                topic,
                retention_ms = plan.value(RETENTION_MS),
                delete_retention_ms = plan.value(DELETE_RETENTION_MS),
                "configs updated for topic {topic}"
            );
            TopicOutcome::Updated(entries)
        }
        Err(e) => {
            report_failure(notifier, &e.to_string()).await;
            TopicOutcome::Failed
        }
    }
}

/// One full pass: enumerate, then evaluate every topic in order.
///
/// Only an enumeration failure is returned; per-topic failures are counted.
pub async fn run_pass(
    cluster: &dyn ClusterAdmin,
    notifier: &dyn Notifier,
    settings: &Settings,
) -> Result<PassReport, ClusterError> {
    let topics = enumerate_topics(cluster, settings).await?;
    tracing::info!(topics = topics.len(), "starting retention pass");

    let mut report = PassReport::default();
    for topic in &topics {
        let outcome = evaluate_topic(cluster, notifier, topic, &settings.targets).await;
        report.record(&outcome);
    }

    tracing::info!(
        checked = report.checked,
        updated = report.updated,
        unchanged = report.unchanged,
        failed = report.failed,
        "retention change process completed"
    );
    Ok(report)
}

/// Connect, run one pass, release the cluster handles.
///
/// A fatal error (connect, admin session, enumeration) is logged and notified
/// here, then returned so the caller can exit non-zero.
pub async fn run<C: ClusterAdmin>(
    connect: impl FnOnce() -> Result<C, ClusterError>,
    notifier: &dyn Notifier,
    settings: &Settings,
) -> Result<PassReport, ClusterError> {
    let result = match connect() {
        Ok(cluster) => run_pass(&cluster, notifier, settings).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        report_failure(notifier, &e.to_string()).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::BoxFuture;
    use crate::cluster::ConfigSnapshot;
    use crate::config::TelegramSettings;

    /// In-memory cluster recording every call.
    #[derive(Default)]
    struct FakeCluster {
        topics: Vec<String>,
        configs: HashMap<String, ConfigSnapshot>,
        fail_list: bool,
        fail_describe: Vec<String>,
        fail_alter: Vec<String>,
        calls: Mutex<Vec<String>>,
        altered: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl FakeCluster {
        fn with_topic(mut self, name: &str, retention: &str, delete_retention: &str) -> Self {
            self.topics.push(name.to_string());
            let snapshot = [
                (RETENTION_MS.to_string(), retention.to_string()),
                (DELETE_RETENTION_MS.to_string(), delete_retention.to_string()),
                ("cleanup.policy".to_string(), "delete".to_string()),
            ]
            .into_iter()
            .collect();
            self.configs.insert(name.to_string(), snapshot);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn altered(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.altered.lock().unwrap().clone()
        }
    }

    impl ClusterAdmin for FakeCluster {
        fn list_topics(&self) -> BoxFuture<'_, Result<Vec<String>, ClusterError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push("list".into());
                if self.fail_list {
                    return Err(ClusterError::ListTopics("broker transport failure".into()));
                }
                Ok(self.topics.clone())
            })
        }

        fn describe_topic<'a>(
            &'a self,
            topic: &'a str,
        ) -> BoxFuture<'a, Result<ConfigSnapshot, ClusterError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("describe {topic}"));
                if self.fail_describe.iter().any(|t| t == topic) {
                    return Err(ClusterError::describe(topic, "UnknownTopicOrPartition"));
                }
                self.configs
                    .get(topic)
                    .cloned()
                    .ok_or_else(|| ClusterError::describe(topic, "UnknownTopicOrPartition"))
            })
        }

        fn alter_topic<'a>(
            &'a self,
            topic: &'a str,
            entries: &'a [(String, String)],
        ) -> BoxFuture<'a, Result<(), ClusterError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("alter {topic}"));
                if self.fail_alter.iter().any(|t| t == topic) {
                    return Err(ClusterError::alter(topic, "PolicyViolation"));
                }
                self.altered
                    .lock()
                    .unwrap()
                    .push((topic.to_string(), entries.to_vec()));
                Ok(())
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                self.messages.lock().unwrap().push(message.to_string());
            })
        }
    }

    fn settings(topics: Option<&[&str]>) -> Settings {
        Settings {
            kafka_ip: "localhost".into(),
            kafka_port: "9092".into(),
            targets: RetentionTargets {
                retention_ms: "1900000".into(),
                delete_retention_ms: "1900000".into(),
            },
            topics: topics.map(|t| t.iter().map(|s| s.to_string()).collect()),
            telegram: TelegramSettings::default(),
        }
    }

    #[tokio::test]
    async fn lowers_retention_above_target() {
        let cluster = FakeCluster::default().with_topic("orders", "3600000", "86400000");
        let notifier = RecordingNotifier::default();

        let report = run_pass(&cluster, &notifier, &settings(None)).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(
            cluster.altered(),
            vec![(
                "orders".to_string(),
                vec![
                    (RETENTION_MS.to_string(), "1900000".to_string()),
                    (DELETE_RETENTION_MS.to_string(), "1900000".to_string()),
                ]
            )]
        );
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn skips_write_when_nothing_exceeds_target() {
        let cluster = FakeCluster::default().with_topic("orders", "1000000", "1900000");
        let notifier = RecordingNotifier::default();

        let report = run_pass(&cluster, &notifier, &settings(None)).await.unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(cluster.calls(), vec!["list", "describe orders"]);
    }

    #[tokio::test]
    async fn single_change_keeps_other_key_current() {
        let cluster = FakeCluster::default().with_topic("orders", "1000000", "86400000");
        let notifier = RecordingNotifier::default();

        let outcome = evaluate_topic(
            &cluster,
            &notifier,
            "orders",
            &settings(None).targets,
        )
        .await;

        assert_eq!(
            outcome,
            TopicOutcome::Updated(vec![
                (RETENTION_MS.to_string(), "1000000".to_string()),
                (DELETE_RETENTION_MS.to_string(), "1900000".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn describe_failure_moves_on_to_next_topic() {
        let mut cluster = FakeCluster::default()
            .with_topic("broken", "3600000", "3600000")
            .with_topic("orders", "3600000", "3600000");
        cluster.fail_describe.push("broken".into());
        let notifier = RecordingNotifier::default();

        let report = run_pass(&cluster, &notifier, &settings(None)).await.unwrap();

        assert_eq!(
            report,
            PassReport {
                checked: 2,
                updated: 1,
                unchanged: 0,
                failed: 1,
            }
        );
        assert_eq!(
            cluster.calls(),
            vec!["list", "describe broken", "describe orders", "alter orders"]
        );
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("💩Error💩\n"));
        assert!(messages[0].contains("topic 'broken'"));
    }

    #[tokio::test]
    async fn alter_failure_is_notified_and_pass_completes() {
        let mut cluster = FakeCluster::default()
            .with_topic("locked", "3600000", "3600000")
            .with_topic("orders", "3600000", "3600000");
        cluster.fail_alter.push("locked".into());
        let notifier = RecordingNotifier::default();

        let report = run_pass(&cluster, &notifier, &settings(None)).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("failed to update configs for topic 'locked'"));
    }

    #[tokio::test]
    async fn explicit_topics_skip_listing() {
        let cluster = FakeCluster::default()
            .with_topic("orders", "1000", "1000")
            .with_topic("payments", "1000", "1000")
            .with_topic("audit", "1000", "1000");

        let topics = enumerate_topics(&cluster, &settings(Some(&["payments", "orders"])))
            .await
            .unwrap();

        assert_eq!(topics, vec!["payments", "orders"]);
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn cluster_order_is_kept() {
        let cluster = FakeCluster::default()
            .with_topic("zeta", "1000", "1000")
            .with_topic("alpha", "1000", "1000");
        let notifier = RecordingNotifier::default();

        run_pass(&cluster, &notifier, &settings(None)).await.unwrap();

        assert_eq!(
            cluster.calls(),
            vec!["list", "describe zeta", "describe alpha"]
        );
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let cluster = FakeCluster {
            fail_list: true,
            ..FakeCluster::default()
        }
        .with_topic("orders", "3600000", "3600000");
        let notifier = RecordingNotifier::default();

        let err = run_pass(&cluster, &notifier, &settings(None)).await.unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, ClusterError::ListTopics(_)));
        assert_eq!(cluster.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn connect_failure_is_notified_and_no_topic_is_touched() {
        let cluster = FakeCluster::default().with_topic("orders", "3600000", "3600000");
        let notifier = RecordingNotifier::default();

        let err = run::<&FakeCluster>(
            || Err(ClusterError::Connect("BrokerTransportFailure".into())),
            &notifier,
            &settings(None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClusterError::Connect(_)));
        assert_eq!(
            notifier.messages(),
            vec!["💩Error💩\nfailed to create Kafka client: BrokerTransportFailure"]
        );
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn listing_failure_through_run_is_notified_once() {
        let cluster = FakeCluster {
            fail_list: true,
            ..FakeCluster::default()
        };
        let notifier = RecordingNotifier::default();

        let err = run(|| Ok(&cluster), &notifier, &settings(None))
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::ListTopics(_)));
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("failed to get topics list"));
    }

    #[tokio::test]
    async fn successful_run_sends_no_alert() {
        let cluster = FakeCluster::default().with_topic("orders", "3600000", "3600000");
        let notifier = RecordingNotifier::default();

        let report = run(|| Ok(&cluster), &notifier, &settings(None)).await.unwrap();

        assert_eq!(report.updated, 1);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn blank_topic_override_checks_nothing() {
        let cluster = FakeCluster::default().with_topic("orders", "3600000", "3600000");
        let notifier = RecordingNotifier::default();

        let report = run_pass(&cluster, &notifier, &settings(Some(&[]))).await.unwrap();

        assert_eq!(report, PassReport::default());
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_explicit_topic_is_per_topic_failure() {
        let cluster = FakeCluster::default().with_topic("orders", "3600000", "3600000");
        let notifier = RecordingNotifier::default();

        let report = run_pass(&cluster, &notifier, &settings(Some(&["missing", "orders"])))
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);
    }
}

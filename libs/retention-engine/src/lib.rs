pub mod cluster;
pub mod config;
pub mod error;
pub mod notify;
pub mod policy;
pub mod runner;

use std::future::Future;
use std::pin::Pin;

pub use cluster::{ClusterAdmin, ConfigSnapshot, KafkaCluster};
pub use config::Settings;
pub use error::ClusterError;
pub use notify::{NoopNotifier, Notifier, TelegramNotifier};
pub use runner::{PassReport, run_pass};

/// Boxed future returned by the cluster and notifier seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

mod logging;

use retention_engine::runner::run;
use retention_engine::{KafkaCluster, Settings, TelegramNotifier};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    tracing::info!("starting change retention");

    let settings = Settings::from_env();
    let notifier = TelegramNotifier::new(settings.telegram.clone());
    let bootstrap = settings.bootstrap_servers();

    // Fatal errors are already logged and notified by `run`.
    if run(|| KafkaCluster::connect(&bootstrap), &notifier, &settings)
        .await
        .is_err()
    {
        std::process::exit(1);
    }
}

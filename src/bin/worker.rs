use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use signflow::{
    config::AppConfig, db, gateways::HttpAutomationNotifier, workers::NotifyDocumentCreatedJob,
    JobHandler, Worker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "worker",
        database_url = %config.redacted_database_url(),
        pool_size = 1,
        automation_enabled = config.automation_webhook_url.is_some(),
        poll_interval_secs = config.worker_poll_interval.as_secs(),
        "loaded configuration"
    );
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let notifier = Arc::new(HttpAutomationNotifier::new(
        config.automation_webhook_url.clone(),
        config.automation_api_key.clone(),
        config.automation_timeout,
    )?);

    let handlers: Vec<Arc<dyn JobHandler>> = vec![Arc::new(NotifyDocumentCreatedJob::new(notifier))];
    let worker = Worker::new(pool, handlers, config.worker_poll_interval);

    tokio::select! {
        _ = worker.run() => {}
        _ = signal::ctrl_c() => {
            tracing::info!("worker received shutdown signal");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

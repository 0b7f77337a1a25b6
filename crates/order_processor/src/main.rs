mod config;

use common::queue::{OrderQueue, SqsQueueClient, SqsQueueConfig};
use common::telemetry::{TelemetryConfig, TelemetryProviders, init_telemetry, shutdown_telemetry};
use config::ServiceConfig;
use order_worker::csv::CsvMetricsRepository;
use order_worker::domain::MetricsCollector;
use order_worker::order_worker::{OrderWorker, OrderWorkerConfig};
use orderflow_runner::Runner;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        queue_url = %config.queue_url,
        concurrency = config.concurrency,
        simulated_work_secs = config.simulated_work_secs,
        environment = %config.environment,
        "Starting order processor"
    );

    let queue: Arc<dyn OrderQueue> = match SqsQueueClient::connect(SqsQueueConfig {
        queue_url: config.queue_url.clone(),
        endpoint: config.queue_endpoint.clone(),
    })
    .await
    {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to initialize queue client: {}", e);
            std::process::exit(1);
        }
    };

    let repository = Arc::new(CsvMetricsRepository::for_environment(
        Path::new(&config.metrics_dir),
        &config.environment,
    ));
    let collector = Arc::new(MetricsCollector::new(repository));

    let worker = OrderWorker::new(
        Arc::clone(&queue),
        Arc::clone(&collector),
        OrderWorkerConfig {
            concurrency: config.concurrency,
            receive_batch_size: config.receive_batch_size,
            receive_wait: Duration::from_secs(config.receive_wait_secs),
            visibility_timeout: Duration::from_secs(config.visibility_timeout_secs),
            receive_backoff: Duration::from_secs(config.receive_backoff_secs),
            simulated_work: Duration::from_secs(config.simulated_work_secs),
        },
    );

    let runner = Runner::new()
        .with_named_process("order_worker", worker.into_runner_process())
        .with_closer({
            let collector = Arc::clone(&collector);
            move || async move {
                // Runs only after the worker has drained: no record can
                // race this flush. A failed flush is reported, not fatal.
                if let Err(e) = collector.flush().await {
                    error!("Failed to flush metrics: {}", e);
                } else {
                    info!("Metrics flushed");
                }

                shutdown_telemetry(telemetry_providers);
                Ok(())
            }
        })
        .with_closer_timeout(Duration::from_secs(30));

    runner.run().await;
}

use crate::domain::{MetricsCollector, OrderPipeline, SimulatedWork, WorkUnit};
use crate::sqs::create_order_processor;
use anyhow::Result;
use common::queue::{OrderQueue, QueueConsumer, ReceiveOptions, SlotPool};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Tuning for the order worker.
#[derive(Debug, Clone)]
pub struct OrderWorkerConfig {
    /// Maximum number of concurrently processed orders.
    pub concurrency: usize,
    pub receive_batch_size: usize,
    pub receive_wait: Duration,
    pub visibility_timeout: Duration,
    pub receive_backoff: Duration,
    pub simulated_work: Duration,
}

/// Queue-draining processing engine for order-creation events.
///
/// Wires the fetch loop, the slot pool, the decoder and the pipeline
/// together; `run` owns the drain step of the shutdown sequence.
pub struct OrderWorker {
    consumer: QueueConsumer,
    pool: Arc<SlotPool>,
}

impl OrderWorker {
    pub fn new(
        queue: Arc<dyn OrderQueue>,
        collector: Arc<MetricsCollector>,
        config: OrderWorkerConfig,
    ) -> Self {
        let work: Arc<dyn WorkUnit> = Arc::new(SimulatedWork::new(config.simulated_work));
        Self::with_work_unit(queue, collector, work, config)
    }

    /// Build the worker around a custom work unit.
    pub fn with_work_unit(
        queue: Arc<dyn OrderQueue>,
        collector: Arc<MetricsCollector>,
        work: Arc<dyn WorkUnit>,
        config: OrderWorkerConfig,
    ) -> Self {
        info!(
            concurrency = config.concurrency,
            receive_batch_size = config.receive_batch_size,
            simulated_work_secs = config.simulated_work.as_secs(),
            "Initializing order worker"
        );

        let pool = Arc::new(SlotPool::new(config.concurrency));
        let pipeline = Arc::new(OrderPipeline::new(
            Arc::clone(&queue),
            Arc::clone(&pool),
            collector,
            work,
        ));
        let handler = create_order_processor(pipeline, Arc::clone(&queue));

        let consumer = QueueConsumer::new(
            queue,
            Arc::clone(&pool),
            ReceiveOptions {
                batch_size: config.receive_batch_size,
                wait: config.receive_wait,
                visibility_timeout: config.visibility_timeout,
                error_backoff: config.receive_backoff,
            },
            handler,
        );

        Self { consumer, pool }
    }

    /// Drain the queue until cancelled, then wait out in-flight work.
    ///
    /// Returning implies every dispatched pipeline, delete step included,
    /// has finished; only then may the metrics flush run.
    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        self.consumer.run(ctx).await?;

        info!(
            in_flight = self.pool.current_depth(),
            "Draining in-flight orders"
        );
        self.pool.drain().await;
        info!("Drain complete");

        Ok(())
    }

    pub fn into_runner_process(
        self,
    ) -> Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<()>> + Send> {
        Box::new(move |ctx| Box::pin(async move { self.run(ctx).await }))
    }
}

use crate::domain::collector::MetricsCollector;
use crate::domain::work::WorkUnit;
use chrono::{DateTime, Utc};
use common::domain::{DomainResult, MetricStage, Order};
use common::queue::{OrderQueue, SlotPool};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Domain service that runs one accepted order through its work unit and
/// emits the three per-stage latency samples.
///
/// Flow, sequential inside the message's task and slot:
/// 1. record `fetched` (queue latency, live depth snapshot)
/// 2. execute the work unit
/// 3. record `processed` (work elapsed)
/// 4. record `completed` (end to end)
/// 5. delete the message
///
/// Nothing is ordered across different orders.
pub struct OrderPipeline {
    queue: Arc<dyn OrderQueue>,
    pool: Arc<SlotPool>,
    collector: Arc<MetricsCollector>,
    work: Arc<dyn WorkUnit>,
}

impl OrderPipeline {
    pub fn new(
        queue: Arc<dyn OrderQueue>,
        pool: Arc<SlotPool>,
        collector: Arc<MetricsCollector>,
        work: Arc<dyn WorkUnit>,
    ) -> Self {
        Self {
            queue,
            pool,
            collector,
            work,
        }
    }

    /// Process one decoded order end to end and acknowledge its message.
    ///
    /// A failing work unit aborts the run before `processed`: no further
    /// samples, no delete, and the queue redelivers the message after its
    /// visibility timeout.
    #[instrument(skip(self, order, ack_token), fields(order_id = %order.order_id))]
    pub async fn process(
        &self,
        order: Order,
        ack_token: &str,
        fetched_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let queue_latency_ms = (fetched_at.timestamp_millis() - order.created_at) as f64;
        self.collector.record(
            &order.order_id,
            MetricStage::Fetched,
            queue_latency_ms,
            self.pool.current_depth(),
        );

        info!(
            customer_id = order.customer_id,
            item_count = order.items.len(),
            queue_latency_ms,
            "processing order"
        );

        let started = tokio::time::Instant::now();
        self.work.execute(&order).await?;
        let process_latency_ms = started.elapsed().as_millis() as f64;

        self.collector.record(
            &order.order_id,
            MetricStage::Processed,
            process_latency_ms,
            self.pool.current_depth(),
        );

        let end_to_end_ms = (Utc::now().timestamp_millis() - order.created_at) as f64;
        self.collector.record(
            &order.order_id,
            MetricStage::Completed,
            end_to_end_ms,
            self.pool.current_depth(),
        );

        info!(process_latency_ms, end_to_end_ms, "completed order");

        // Not retried here: redelivery after the visibility timeout covers
        // a failed delete.
        if let Err(e) = self.queue.delete(ack_token).await {
            warn!(error = %e, "failed to delete message after processing");
        }

        Ok(())
    }
}

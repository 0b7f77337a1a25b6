use crate::queue::pool::{Slot, SlotPool};
use crate::queue::traits::{OrderQueue, QueueMessage};
use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Per-message handler invoked by the consumer.
///
/// The handler owns the message and its slot for the lifetime of the
/// spawned task; the slot must be held until all work for the message,
/// including its delete, has finished.
pub type MessageHandler = Arc<dyn Fn(QueueMessage, Slot) -> BoxFuture<'static, ()> + Send + Sync>;

/// Receive-call tuning for the fetch loop.
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    pub batch_size: usize,
    pub wait: Duration,
    pub visibility_timeout: Duration,
    pub error_backoff: Duration,
}

/// Sequential fetch loop draining the order queue into the slot pool.
///
/// One receive call at a time; each received message is dispatched as an
/// independent task once a slot is free. Slot acquisition is the only
/// backpressure mechanism: a saturated pool blocks the loop, so work cannot
/// pile up past what finishes within the visibility timeout.
pub struct QueueConsumer {
    queue: Arc<dyn OrderQueue>,
    pool: Arc<SlotPool>,
    options: ReceiveOptions,
    handler: MessageHandler,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn OrderQueue>,
        pool: Arc<SlotPool>,
        options: ReceiveOptions,
        handler: MessageHandler,
    ) -> Self {
        Self {
            queue,
            pool,
            options,
            handler,
        }
    }

    /// Poll the queue until cancelled.
    ///
    /// Cancellation stops new receives immediately; messages already
    /// received are always dispatched, and dispatched tasks are never
    /// interrupted.
    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!(
            batch_size = self.options.batch_size,
            wait_secs = self.options.wait.as_secs(),
            visibility_timeout_secs = self.options.visibility_timeout.as_secs(),
            "Starting consumer loop"
        );

        loop {
            if ctx.is_cancelled() {
                break;
            }

            // Abandoning an in-flight receive on shutdown is safe: the call
            // is read-only and anything it would have delivered reappears
            // after the visibility timeout.
            let received = tokio::select! {
                _ = ctx.cancelled() => break,
                result = self.queue.receive(
                    self.options.batch_size,
                    self.options.wait,
                    self.options.visibility_timeout,
                ) => result,
            };

            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    error!(error = %e, "Receive failed, backing off");
                    tokio::time::sleep(self.options.error_backoff).await;
                    continue;
                }
            };

            if messages.is_empty() {
                debug!("No messages received");
                continue;
            }

            debug!(message_count = messages.len(), "Received message batch");

            for message in messages {
                // Blocks while the pool is saturated.
                let slot = self.pool.acquire().await;
                tokio::spawn((self.handler)(message, slot));
            }
        }

        info!("Consumer stopped, no further receives will be issued");
        Ok(())
    }
}

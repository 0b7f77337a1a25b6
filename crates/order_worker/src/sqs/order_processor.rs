use crate::domain::{DecodedMessage, OrderPipeline, decode_message};
use chrono::Utc;
use common::queue::{MessageHandler, OrderQueue, QueueMessage, Slot};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Create the per-message handler dispatched by the queue consumer.
///
/// Decodes the delivery, then either runs the pipeline or discards the
/// poison message. The slot guard travels into the spawned task and is
/// released when the handler future finishes, delete step included.
pub fn create_order_processor(
    pipeline: Arc<OrderPipeline>,
    queue: Arc<dyn OrderQueue>,
) -> MessageHandler {
    Arc::new(move |message: QueueMessage, slot: Slot| {
        let pipeline = Arc::clone(&pipeline);
        let queue = Arc::clone(&queue);

        Box::pin(async move {
            let _slot = slot;
            let fetched_at = Utc::now();

            match decode_message(&message.body) {
                DecodedMessage::Order(order) => {
                    debug!(order_id = %order.order_id, "decoded order");
                    if let Err(e) = pipeline.process(order, &message.ack_token, fetched_at).await {
                        warn!(error = %e, "order processing failed, leaving message for redelivery");
                    }
                }
                DecodedMessage::Poison { reason } => {
                    // Deleted without retry or dead-letter routing: bounded
                    // queue growth wins over retry-ability of bad input.
                    warn!(reason = %reason, "discarding undecodable message");
                    if let Err(e) = queue.delete(&message.ack_token).await {
                        error!(error = %e, "failed to delete poison message");
                    }
                }
            }
        })
    })
}

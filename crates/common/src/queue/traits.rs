use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A message as delivered by the queue service.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// Raw body: the transport envelope wrapping the serialized order.
    pub body: String,
    /// Token required to delete (acknowledge) this delivery.
    pub ack_token: String,
}

/// Trait for the at-least-once order queue.
///
/// Every call is an independent stateless request, so one client may be
/// shared read-only across tasks. An undeleted message reappears after its
/// visibility timeout; redelivery counting and dead-letter routing belong to
/// the queue service, not to this component.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OrderQueue: Send + Sync {
    /// Receive up to `max_messages`, long-polling for at most `wait`.
    ///
    /// Received messages stay invisible to other consumers for
    /// `visibility_timeout`.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueueMessage>>;

    /// Delete a delivery by its ack token.
    async fn delete(&self, ack_token: &str) -> Result<()>;
}

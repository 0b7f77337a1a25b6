use crate::queue::traits::{OrderQueue, QueueMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use std::time::Duration;
use tracing::{info, warn};

/// Connection settings for the SQS-backed order queue.
#[derive(Debug, Clone)]
pub struct SqsQueueConfig {
    pub queue_url: String,
    /// Custom service endpoint for non-production emulation.
    pub endpoint: Option<String>,
}

/// Concrete implementation of [`OrderQueue`] over the AWS SQS API.
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueueClient {
    /// Build a client from the default credential/region chain, honoring an
    /// optional endpoint override.
    pub async fn connect(config: SqsQueueConfig) -> Result<Self> {
        info!(queue_url = %config.queue_url, "Connecting to SQS");

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint) = &config.endpoint {
            info!(endpoint = %endpoint, "Using custom queue endpoint");
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Ok(Self {
            client: aws_sdk_sqs::Client::new(&aws_config),
            queue_url: config.queue_url,
        })
    }
}

#[async_trait]
impl OrderQueue for SqsQueueClient {
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages as i32)
            .wait_time_seconds(wait.as_secs() as i32)
            .visibility_timeout(visibility_timeout.as_secs() as i32)
            .send()
            .await
            .context("Failed to receive messages")?;

        let messages = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|message| match (message.body, message.receipt_handle) {
                (Some(body), Some(ack_token)) => Some(QueueMessage { body, ack_token }),
                _ => {
                    warn!("Dropping delivery without body or receipt handle");
                    None
                }
            })
            .collect();

        Ok(messages)
    }

    async fn delete(&self, ack_token: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(ack_token)
            .send()
            .await
            .context("Failed to delete message")?;

        Ok(())
    }
}

use chrono::Utc;
use common::domain::{DomainResult, MetricEvent, MetricStage, MetricsRepository, StoreMetricsInput};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// Thread-safe append-only buffer of latency samples.
///
/// `record` stays off the I/O path; the buffer is handed to the repository
/// in one shot by `flush`, which the shutdown sequence calls exactly once
/// after every producer has stopped.
pub struct MetricsCollector {
    buffer: Mutex<Vec<MetricEvent>>,
    repository: Arc<dyn MetricsRepository>,
}

impl MetricsCollector {
    pub fn new(repository: Arc<dyn MetricsRepository>) -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            repository,
        }
    }

    /// Append one sample. Safe for concurrent callers, one per in-flight
    /// task.
    pub fn record(&self, order_id: &str, stage: MetricStage, latency_ms: f64, queue_depth: usize) {
        let event = MetricEvent {
            order_id: order_id.to_string(),
            stage,
            latency_ms,
            queue_depth,
            recorded_at: Utc::now(),
        };

        self.buffer
            .lock()
            .expect("metrics buffer lock poisoned")
            .push(event);
    }

    /// Number of buffered samples.
    pub fn pending(&self) -> usize {
        self.buffer
            .lock()
            .expect("metrics buffer lock poisoned")
            .len()
    }

    /// Drain the buffer into durable storage.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> DomainResult<()> {
        let events = {
            let mut buffer = self.buffer.lock().expect("metrics buffer lock poisoned");
            std::mem::take(&mut *buffer)
        };

        debug!(event_count = events.len(), "flushing metric events");
        self.repository
            .store_batch(StoreMetricsInput { events })
            .await
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<MetricEvent> {
        self.buffer
            .lock()
            .expect("metrics buffer lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DomainError, MockMetricsRepository};

    #[tokio::test]
    async fn test_record_appends_and_flush_stores_batch() {
        let mut mock_repo = MockMetricsRepository::new();
        mock_repo
            .expect_store_batch()
            .withf(|input: &StoreMetricsInput| {
                input.events.len() == 2
                    && input.events[0].stage == MetricStage::Fetched
                    && input.events[1].stage == MetricStage::Processed
            })
            .times(1)
            .return_once(|_| Ok(()));

        let collector = MetricsCollector::new(Arc::new(mock_repo));
        collector.record("t1", MetricStage::Fetched, 120.0, 1);
        collector.record("t1", MetricStage::Processed, 3000.0, 1);
        assert_eq!(collector.pending(), 2);

        let result = collector.flush().await;

        assert!(result.is_ok());
        assert_eq!(collector.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_records_are_all_buffered() {
        let mock_repo = MockMetricsRepository::new();
        let collector = Arc::new(MetricsCollector::new(Arc::new(mock_repo)));

        let mut handles = Vec::new();
        for i in 0..20 {
            let collector = Arc::clone(&collector);
            handles.push(tokio::spawn(async move {
                collector.record(&format!("order-{i}"), MetricStage::Fetched, i as f64, 1);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(collector.pending(), 20);
    }

    #[tokio::test]
    async fn test_flush_error_propagates() {
        let mut mock_repo = MockMetricsRepository::new();
        mock_repo
            .expect_store_batch()
            .times(1)
            .return_once(|_| Err(DomainError::RepositoryError(anyhow::anyhow!("disk full"))));

        let collector = MetricsCollector::new(Arc::new(mock_repo));
        collector.record("t1", MetricStage::Completed, 1.0, 0);

        let result = collector.flush().await;

        assert!(matches!(result, Err(DomainError::RepositoryError(_))));
    }

    #[tokio::test]
    async fn test_flush_with_empty_buffer_stores_empty_batch() {
        let mut mock_repo = MockMetricsRepository::new();
        mock_repo
            .expect_store_batch()
            .withf(|input: &StoreMetricsInput| input.events.is_empty())
            .times(1)
            .return_once(|_| Ok(()));

        let collector = MetricsCollector::new(Arc::new(mock_repo));

        assert!(collector.flush().await.is_ok());
    }
}

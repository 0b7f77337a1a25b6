use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, MetricEvent, MetricsRepository, StoreMetricsInput};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// CSV file implementation of [`MetricsRepository`].
///
/// One file per run, written in a single shot at flush time. Rows carry
/// `order_id,event_type,latency_ms,queue_depth,timestamp`; an empty run
/// still produces the header so downstream tooling always finds a file.
pub struct CsvMetricsRepository {
    path: PathBuf,
}

impl CsvMetricsRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Deterministic per-environment file under `dir`.
    pub fn for_environment(dir: &Path, environment: &str) -> Self {
        Self {
            path: dir.join(format!("order_metrics_{environment}.csv")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(events: &[MetricEvent]) -> String {
        let mut csv = String::from("order_id,event_type,latency_ms,queue_depth,timestamp\n");

        for event in events {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                event.order_id,
                event.stage,
                event.latency_ms,
                event.queue_depth,
                event.recorded_at.to_rfc3339(),
            ));
        }

        csv
    }
}

#[async_trait]
impl MetricsRepository for CsvMetricsRepository {
    async fn store_batch(&self, input: StoreMetricsInput) -> DomainResult<()> {
        debug!(
            event_count = input.events.len(),
            path = %self.path.display(),
            "writing metrics file"
        );

        let contents = Self::render(&input.events);
        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            error!(path = %self.path.display(), "failed to write metrics file: {}", e);
            DomainError::RepositoryError(e.into())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::domain::MetricStage;

    fn event(order_id: &str, stage: MetricStage, latency_ms: f64) -> MetricEvent {
        MetricEvent {
            order_id: order_id.to_string(),
            stage,
            latency_ms,
            queue_depth: 2,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_batch_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let repository = CsvMetricsRepository::for_environment(dir.path(), "test");

        let input = StoreMetricsInput {
            events: vec![
                event("t1", MetricStage::Fetched, 120.0),
                event("t1", MetricStage::Processed, 3000.0),
            ],
        };

        repository.store_batch(input).await.unwrap();

        let contents = tokio::fs::read_to_string(repository.path()).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "order_id,event_type,latency_ms,queue_depth,timestamp");
        assert!(lines[1].starts_with("t1,fetched,120,2,"));
        assert!(lines[2].starts_with("t1,processed,3000,2,"));
    }

    #[tokio::test]
    async fn test_store_batch_with_no_events_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let repository = CsvMetricsRepository::for_environment(dir.path(), "test");

        repository
            .store_batch(StoreMetricsInput { events: vec![] })
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(repository.path()).await.unwrap();

        assert_eq!(
            contents,
            "order_id,event_type,latency_ms,queue_depth,timestamp\n"
        );
    }

    #[tokio::test]
    async fn test_file_name_is_deterministic_per_environment() {
        let repository = CsvMetricsRepository::for_environment(Path::new("/var/metrics"), "local");

        assert_eq!(
            repository.path(),
            Path::new("/var/metrics/order_metrics_local.csv")
        );
    }

    #[tokio::test]
    async fn test_store_batch_fails_when_directory_missing() {
        let repository =
            CsvMetricsRepository::new(PathBuf::from("/nonexistent-dir/order_metrics.csv"));

        let result = repository
            .store_batch(StoreMetricsInput { events: vec![] })
            .await;

        assert!(matches!(result, Err(DomainError::RepositoryError(_))));
    }
}

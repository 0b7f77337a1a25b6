use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing stage a latency sample was taken at.
///
/// For any successfully processed order the three stages are emitted in
/// declaration order; a discarded poison message emits none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStage {
    Fetched,
    Processed,
    Completed,
}

impl std::fmt::Display for MetricStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            MetricStage::Fetched => "fetched",
            MetricStage::Processed => "processed",
            MetricStage::Completed => "completed",
        };
        f.write_str(stage)
    }
}

/// One latency sample taken inside a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    pub order_id: String,
    pub stage: MetricStage,
    pub latency_ms: f64,
    /// Snapshot of the in-flight counter at the instant of recording.
    pub queue_depth: usize,
    pub recorded_at: DateTime<Utc>,
}

/// Input for persisting a full run of metric events (single flush).
#[derive(Debug, Clone)]
pub struct StoreMetricsInput {
    pub events: Vec<MetricEvent>,
}

/// Trait for persisting metric events to durable tabular storage.
///
/// Implementations write the whole buffer in one shot; the collector calls
/// this exactly once per run, after every producer has stopped.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn store_batch(&self, input: StoreMetricsInput) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_file_format() {
        assert_eq!(MetricStage::Fetched.to_string(), "fetched");
        assert_eq!(MetricStage::Processed.to_string(), "processed");
        assert_eq!(MetricStage::Completed.to_string(), "completed");
    }
}

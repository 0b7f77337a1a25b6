use async_trait::async_trait;
use common::domain::{DomainResult, Order};
use std::time::Duration;
use tracing::debug;

/// The unit of work executed once per accepted order.
///
/// Pluggable so tests can substitute variable-duration or failing work; the
/// shipped implementation stands in for a downstream synchronous dependency
/// and never fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkUnit: Send + Sync {
    async fn execute(&self, order: &Order) -> DomainResult<()>;
}

/// Fixed-duration stand-in for downstream processing (payment verification
/// in the original deployment).
pub struct SimulatedWork {
    duration: Duration,
}

impl SimulatedWork {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl WorkUnit for SimulatedWork {
    async fn execute(&self, order: &Order) -> DomainResult<()> {
        debug!(
            order_id = %order.order_id,
            duration_ms = self.duration.as_millis() as u64,
            "simulating downstream work"
        );
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::Item;

    fn order() -> Order {
        Order {
            order_id: "t1".to_string(),
            customer_id: 1,
            status: String::new(),
            items: vec![Item {
                product_id: "p1".to_string(),
                quantity: 2,
                price: 10.5,
            }],
            created_at: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_work_takes_configured_duration() {
        let work = SimulatedWork::new(Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        work.execute(&order()).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_zero_duration_work_completes_immediately() {
        let work = SimulatedWork::new(Duration::ZERO);

        assert!(work.execute(&order()).await.is_ok());
    }
}

pub mod domain;
pub mod queue;
pub mod telemetry;

pub use domain::*;
pub use queue::*;
pub use telemetry::*;

// Re-export mocks when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockMetricsRepository;
#[cfg(any(test, feature = "testing"))]
pub use queue::MockOrderQueue;

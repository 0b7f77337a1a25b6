mod metrics_repository;

pub use metrics_repository::*;

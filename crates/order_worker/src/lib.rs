pub mod csv;
pub mod domain;
pub mod order_worker;
pub mod sqs;

pub use csv::*;
pub use domain::*;
pub use order_worker::*;
pub use sqs::*;

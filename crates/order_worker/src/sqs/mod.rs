mod order_processor;

pub use order_processor::*;

use serde::{Deserialize, Serialize};

/// A single line item within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
}

/// Domain entity for an order-creation event.
///
/// Decoded once from the inner message payload and immutable afterwards; an
/// order lives only for the duration of the pipeline run that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: i64,
    /// Ingress may omit the status; it plays no role in processing.
    #[serde(default)]
    pub status: String,
    pub items: Vec<Item>,
    /// Creation time at the ingress service, epoch milliseconds.
    pub created_at: i64,
}

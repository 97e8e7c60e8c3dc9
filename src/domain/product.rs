use serde::{Deserialize, Serialize};

/// A catalogue entry. `in_stock` is the only field that changes after
/// creation, and only through stock decrements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub passenger_capacity: i64,
    pub maximum_speed: i64,
    pub in_stock: i64,
}

/// Outcome of one idempotent stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Applied; carries the new stock level.
    Applied(i64),
    /// This delivery was applied before.
    AlreadyApplied,
    /// No product under that id. Nothing is written besides the delivery.
    UnknownProduct,
}

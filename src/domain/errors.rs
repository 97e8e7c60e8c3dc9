use thiserror::Error;

use super::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Product ID {0} does not exist")]
    ProductNotFound(String),
    /// Raised by the gateway when a line item names a product the products
    /// service does not know.
    #[error("Product Id {0}")]
    UnknownProduct(String),
    #[error("Order with id {0} not found")]
    OrderNotFound(i32),
    #[error("Order detail {detail_id} does not match order {order_id}")]
    OrderDetailMismatch { order_id: i32, detail_id: i32 },
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

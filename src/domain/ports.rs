use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;
use super::events::Event;
use super::order::{NewOrderDetail, Order, OrderUpdate};
use super::product::{Product, StockDecrement};

/// Key-value backed product storage.
pub trait ProductStore: Send + Sync + 'static {
    fn get(&self, product_id: &str) -> Result<Product, DomainError>;
    fn list(&self) -> Result<Vec<Product>, DomainError>;
    /// Upsert: any existing entry with the same id is overwritten.
    fn create(&self, product: &Product) -> Result<(), DomainError>;
    /// Subtract `amount` from the stock of `product_id` at most once per
    /// `delivery` key. The delivery is recorded atomically with the
    /// decrement, so a failed call leaves nothing behind. There is no floor.
    fn decrement_stock(
        &self,
        product_id: &str,
        amount: i64,
        delivery: &str,
    ) -> Result<StockDecrement, DomainError>;
    /// Returns the number of fields removed; 0 when there is no product under
    /// `product_id`.
    fn delete(&self, product_id: &str) -> Result<u64, DomainError>;
    fn test_connection(&self) -> Result<(), DomainError>;
}

/// Relational order storage. `create` also records the `order_created`
/// event in the outbox within the same transaction.
pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, details: Vec<NewOrderDetail>) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: i32) -> Result<Option<Order>, DomainError>;
    fn list(&self) -> Result<Vec<Order>, DomainError>;
    fn update(&self, update: &OrderUpdate) -> Result<Order, DomainError>;
    /// Returns `false` when the order did not exist.
    fn delete(&self, id: i32) -> Result<bool, DomainError>;
    /// Returns the number of orders removed.
    fn delete_with_product_id(&self, product_id: &str) -> Result<usize, DomainError>;
    fn test_connection(&self) -> Result<(), DomainError>;
}

pub trait OutboxRepository: Send + Sync + 'static {
    fn fetch_unpublished(&self, limit: i64) -> Result<Vec<Event>, DomainError>;
    fn mark_published(&self, ids: &[Uuid]) -> Result<(), DomainError>;
}

pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: &Event) -> Result<(), DomainError>;
}

/// RPC surface of the products service.
pub trait ProductsRpc: Send + Sync + 'static {
    fn test_connection(&self) -> Result<(), DomainError>;
    fn get(&self, product_id: &str) -> Result<Product, DomainError>;
    fn list(&self) -> Result<Vec<Product>, DomainError>;
    /// `payload` is validated against the product schema before storing.
    fn create(&self, payload: Value) -> Result<Product, DomainError>;
    fn delete(&self, product_id: &str) -> Result<u64, DomainError>;
}

/// RPC surface of the orders service.
pub trait OrdersRpc: Send + Sync + 'static {
    fn test_connection(&self) -> Result<(), DomainError>;
    fn list_orders(&self) -> Result<Vec<Order>, DomainError>;
    fn get_order(&self, id: i32) -> Result<Order, DomainError>;
    fn create_order(&self, details: Vec<NewOrderDetail>) -> Result<Order, DomainError>;
    fn update_order(&self, update: OrderUpdate) -> Result<Order, DomainError>;
    fn delete_order(&self, id: i32) -> Result<(), DomainError>;
    fn delete_orders_with_product_id(&self, product_id: &str) -> Result<usize, DomainError>;
}

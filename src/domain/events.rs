use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::order::Order;

pub const ORDERS_SOURCE: &str = "orders";
pub const ORDER_CREATED: &str = "order_created";

/// An event as handed to subscribers: who emitted it, what it is, and the
/// JSON body. `id` is stable across redeliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub payload: Value,
}

pub fn order_created_payload(order: &Order) -> Value {
    json!({ "order": order.to_json() })
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    pub order: OrderCreatedOrder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreatedOrder {
    pub id: i32,
    pub order_details: Vec<OrderCreatedLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreatedLine {
    pub product_id: String,
    pub quantity: i64,
}

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::order::{Order, OrderDetail};
use crate::schema::{order_details, order_outbox, orders};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_details)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderDetailRow {
    pub id: i32,
    pub order_id: i32,
    pub product_id: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_details)]
pub struct NewOrderDetailRow {
    pub order_id: i32,
    pub product_id: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        OrderDetail {
            id: row.id,
            product_id: row.product_id,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

pub fn to_order(order: OrderRow, mut details: Vec<OrderDetailRow>) -> Order {
    details.sort_by_key(|d| d.id);
    Order {
        id: order.id,
        order_details: details.into_iter().map(OrderDetail::from).collect(),
    }
}

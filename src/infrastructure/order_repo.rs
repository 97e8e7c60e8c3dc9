use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::events::{order_created_payload, Event, ORDERS_SOURCE, ORDER_CREATED};
use crate::domain::order::{match_detail_updates, NewOrderDetail, Order, OrderUpdate};
use crate::domain::ports::{OrderRepository, OutboxRepository};
use crate::schema::{order_details, order_outbox, orders};

use super::models::{
    to_order, NewOrderDetailRow, NewOutboxEventRow, OrderDetailRow, OrderRow, OutboxEventRow,
};

#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_order(conn: &mut PgConnection, id: i32) -> Result<Option<Order>, DomainError> {
    let order = orders::table
        .find(id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let details = OrderDetailRow::belonging_to(&order)
        .select(OrderDetailRow::as_select())
        .load(conn)?;

    Ok(Some(to_order(order, details)))
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, details: Vec<NewOrderDetail>) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let order_row = diesel::insert_into(orders::table)
                .default_values()
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 2. Insert its line items
            let new_rows: Vec<NewOrderDetailRow> = details
                .into_iter()
                .map(|d| NewOrderDetailRow {
                    order_id: order_row.id,
                    product_id: d.product_id,
                    price: d.price,
                    quantity: d.quantity,
                })
                .collect();
            let detail_rows = if new_rows.is_empty() {
                Vec::new()
            } else {
                diesel::insert_into(order_details::table)
                    .values(&new_rows)
                    .returning(OrderDetailRow::as_returning())
                    .get_results(conn)?
            };
            let order = to_order(order_row, detail_rows);

            // 3. Record order_created in the outbox within the same transaction
            diesel::insert_into(order_outbox::table)
                .values(&NewOutboxEventRow {
                    id: Uuid::new_v4(),
                    aggregate_type: "Order".to_string(),
                    aggregate_id: order.id.to_string(),
                    event_type: ORDER_CREATED.to_string(),
                    payload: order_created_payload(&order),
                })
                .execute(conn)?;

            Ok(order)
        })
    }

    fn find_by_id(&self, id: i32) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        load_order(&mut conn, id)
    }

    fn list(&self) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .select(OrderRow::as_select())
            .order(orders::id.asc())
            .load(&mut conn)?;

        let details = OrderDetailRow::belonging_to(&rows)
            .select(OrderDetailRow::as_select())
            .load(&mut conn)?
            .grouped_by(&rows);

        Ok(rows
            .into_iter()
            .zip(details)
            .map(|(order, details)| to_order(order, details))
            .collect())
    }

    fn update(&self, update: &OrderUpdate) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = orders::table
                .find(update.id)
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?
                .ok_or(DomainError::OrderNotFound(update.id))?;

            let stored_ids: Vec<i32> = OrderDetailRow::belonging_to(&order)
                .select(order_details::id)
                .order(order_details::id.asc())
                .load(conn)?;

            for replacement in match_detail_updates(order.id, &stored_ids, &update.order_details)? {
                diesel::update(order_details::table.find(replacement.id))
                    .set((
                        order_details::price.eq(replacement.price.clone()),
                        order_details::quantity.eq(replacement.quantity),
                    ))
                    .execute(conn)?;
            }

            load_order(conn, order.id)?.ok_or(DomainError::OrderNotFound(order.id))
        })
    }

    fn delete(&self, id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::delete(order_details::table.filter(order_details::order_id.eq(id)))
                .execute(conn)?;
            let removed = diesel::delete(orders::table.find(id)).execute(conn)?;
            Ok(removed > 0)
        })
    }

    fn delete_with_product_id(&self, product_id: &str) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order_ids: Vec<i32> = order_details::table
                .filter(order_details::product_id.eq(product_id))
                .select(order_details::order_id)
                .distinct()
                .load(conn)?;

            if order_ids.is_empty() {
                return Ok(0);
            }

            // Whole orders go, not just the matching line items.
            diesel::delete(order_details::table.filter(order_details::order_id.eq_any(order_ids.clone())))
                .execute(conn)?;
            let removed = diesel::delete(orders::table.filter(orders::id.eq_any(order_ids)))
                .execute(conn)?;
            Ok(removed)
        })
    }

    fn test_connection(&self) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        orders::table
            .find(-1)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(())
    }
}

impl OutboxRepository for DieselOrderRepository {
    fn fetch_unpublished(&self, limit: i64) -> Result<Vec<Event>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_outbox::table
            .filter(order_outbox::published_at.is_null())
            .order(order_outbox::created_at.asc())
            .limit(limit)
            .select(OutboxEventRow::as_select())
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|row| Event {
                id: row.id,
                source: ORDERS_SOURCE.to_string(),
                event_type: row.event_type,
                payload: row.payload,
            })
            .collect())
    }

    fn mark_published(&self, ids: &[Uuid]) -> Result<(), DomainError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get()?;

        diesel::update(order_outbox::table.filter(order_outbox::id.eq_any(ids.to_vec())))
            .set(order_outbox::published_at.eq(Some(Utc::now())))
            .execute(&mut conn)?;
        Ok(())
    }
}

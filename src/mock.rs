//! In-memory stores for tests. Clones share state, so one instance can back
//! both a service and the outbox relay.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::{order_created_payload, Event, ORDERS_SOURCE, ORDER_CREATED};
use crate::domain::order::{
    match_detail_updates, NewOrderDetail, Order, OrderDetail, OrderUpdate,
};
use crate::domain::ports::{OrderRepository, OutboxRepository, ProductStore};
use crate::domain::product::{Product, StockDecrement};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().expect("mock state poisoned")
}

fn unavailable() -> DomainError {
    DomainError::Internal("connection refused".to_string())
}

#[derive(Default)]
struct ProductState {
    products: HashMap<String, Product>,
    deliveries: HashSet<String>,
    failing_decrements: HashMap<String, usize>,
}

#[derive(Clone, Default)]
pub struct MockProductStore {
    state: Arc<Mutex<ProductState>>,
    down: Arc<AtomicBool>,
}

impl MockProductStore {
    pub fn set_unavailable(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Make the next `times` decrements of `product_id` fail without
    /// writing anything.
    pub fn fail_decrements(&self, product_id: &str, times: usize) {
        lock(&self.state)
            .failing_decrements
            .insert(product_id.to_string(), times);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.down.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

impl ProductStore for MockProductStore {
    fn get(&self, product_id: &str) -> Result<Product, DomainError> {
        self.check()?;
        lock(&self.state)
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| DomainError::ProductNotFound(product_id.to_string()))
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        self.check()?;
        Ok(lock(&self.state).products.values().cloned().collect())
    }

    fn create(&self, product: &Product) -> Result<(), DomainError> {
        self.check()?;
        lock(&self.state)
            .products
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    fn decrement_stock(
        &self,
        product_id: &str,
        amount: i64,
        delivery: &str,
    ) -> Result<StockDecrement, DomainError> {
        self.check()?;
        let mut state = lock(&self.state);
        if let Some(left) = state.failing_decrements.get_mut(product_id) {
            if *left > 0 {
                *left -= 1;
                return Err(unavailable());
            }
        }
        if state.deliveries.contains(delivery) {
            return Ok(StockDecrement::AlreadyApplied);
        }
        let outcome = match state.products.get_mut(product_id) {
            Some(product) => {
                product.in_stock -= amount;
                StockDecrement::Applied(product.in_stock)
            }
            None => StockDecrement::UnknownProduct,
        };
        state.deliveries.insert(delivery.to_string());
        Ok(outcome)
    }

    fn delete(&self, product_id: &str) -> Result<u64, DomainError> {
        self.check()?;
        Ok(match lock(&self.state).products.remove(product_id) {
            Some(_) => 5,
            None => 0,
        })
    }

    fn test_connection(&self) -> Result<(), DomainError> {
        self.check()
    }
}

#[derive(Default)]
struct OrderState {
    orders: BTreeMap<i32, Order>,
    next_order_id: i32,
    next_detail_id: i32,
    outbox: Vec<(Event, bool)>,
}

#[derive(Clone, Default)]
pub struct MockOrderRepository {
    state: Arc<Mutex<OrderState>>,
    down: Arc<AtomicBool>,
}

impl MockOrderRepository {
    pub fn set_unavailable(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.down.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

impl OrderRepository for MockOrderRepository {
    fn create(&self, details: Vec<NewOrderDetail>) -> Result<Order, DomainError> {
        self.check()?;
        let mut state = lock(&self.state);

        state.next_order_id += 1;
        let id = state.next_order_id;
        let mut order_details = Vec::with_capacity(details.len());
        for d in details {
            state.next_detail_id += 1;
            order_details.push(OrderDetail {
                id: state.next_detail_id,
                product_id: d.product_id,
                price: d.price,
                quantity: d.quantity,
            });
        }
        let order = Order { id, order_details };

        state.orders.insert(id, order.clone());
        state.outbox.push((
            Event {
                id: Uuid::new_v4(),
                source: ORDERS_SOURCE.to_string(),
                event_type: ORDER_CREATED.to_string(),
                payload: order_created_payload(&order),
            },
            false,
        ));
        Ok(order)
    }

    fn find_by_id(&self, id: i32) -> Result<Option<Order>, DomainError> {
        self.check()?;
        Ok(lock(&self.state).orders.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Order>, DomainError> {
        self.check()?;
        Ok(lock(&self.state).orders.values().cloned().collect())
    }

    fn update(&self, update: &OrderUpdate) -> Result<Order, DomainError> {
        self.check()?;
        let mut state = lock(&self.state);
        let order = state
            .orders
            .get_mut(&update.id)
            .ok_or(DomainError::OrderNotFound(update.id))?;

        let stored_ids: Vec<i32> = order.order_details.iter().map(|d| d.id).collect();
        let replacements = match_detail_updates(order.id, &stored_ids, &update.order_details)?;
        for (detail, replacement) in order.order_details.iter_mut().zip(replacements) {
            detail.price = replacement.price.clone();
            detail.quantity = replacement.quantity;
        }
        Ok(order.clone())
    }

    fn delete(&self, id: i32) -> Result<bool, DomainError> {
        self.check()?;
        Ok(lock(&self.state).orders.remove(&id).is_some())
    }

    fn delete_with_product_id(&self, product_id: &str) -> Result<usize, DomainError> {
        self.check()?;
        let mut state = lock(&self.state);
        let before = state.orders.len();
        state
            .orders
            .retain(|_, order| !order.order_details.iter().any(|d| d.product_id == product_id));
        Ok(before - state.orders.len())
    }

    fn test_connection(&self) -> Result<(), DomainError> {
        self.check()
    }
}

impl OutboxRepository for MockOrderRepository {
    fn fetch_unpublished(&self, limit: i64) -> Result<Vec<Event>, DomainError> {
        self.check()?;
        Ok(lock(&self.state)
            .outbox
            .iter()
            .filter(|(_, published)| !published)
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(event, _)| event.clone())
            .collect())
    }

    fn mark_published(&self, ids: &[Uuid]) -> Result<(), DomainError> {
        self.check()?;
        for (event, published) in lock(&self.state).outbox.iter_mut() {
            if ids.contains(&event.id) {
                *published = true;
            }
        }
        Ok(())
    }
}

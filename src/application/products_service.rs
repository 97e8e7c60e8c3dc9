use serde_json::Value;

use crate::domain::errors::DomainError;
use crate::domain::events::{Event, OrderCreated};
use crate::domain::ports::{EventHandler, ProductStore, ProductsRpc};
use crate::domain::product::{Product, StockDecrement};
use crate::domain::validation::load_product;
use crate::telemetry::LogContext;

pub struct ProductsService<S> {
    store: S,
    log: LogContext,
}

impl<S: ProductStore> ProductsService<S> {
    pub fn new(store: S, log: LogContext) -> Self {
        Self { store, log }
    }

    /// Apply an `order_created` event: decrement stock by the ordered
    /// quantity of every line item. Each line is applied at most once, keyed
    /// by event id and line index, so a redelivery after a failure applies
    /// only the lines still outstanding. Earlier decrements are never undone.
    pub fn handle_order_created(&self, event: &Event) -> Result<(), DomainError> {
        let target = self.log.target();
        let created: OrderCreated = serde_json::from_value(event.payload.clone())?;

        for (index, line) in created.order.order_details.iter().enumerate() {
            let delivery = format!("{}:{}", event.id, index);
            let outcome = self
                .store
                .decrement_stock(&line.product_id, line.quantity, &delivery)
                .inspect_err(|e| {
                    log::error!(
                        target: target,
                        "Failed to decrement stock of {} for order {}: {}",
                        line.product_id,
                        created.order.id,
                        e
                    )
                })?;
            match outcome {
                StockDecrement::Applied(remaining) => log::info!(
                    target: target,
                    "Stock of {} decremented by {} to {}",
                    line.product_id,
                    line.quantity,
                    remaining
                ),
                StockDecrement::AlreadyApplied => log::info!(
                    target: target,
                    "Line {} of event {} already applied, skipping",
                    index,
                    event.id
                ),
                StockDecrement::UnknownProduct => log::warn!(
                    target: target,
                    "Product {} of order {} no longer exists, stock left untouched",
                    line.product_id,
                    created.order.id
                ),
            }
        }
        Ok(())
    }
}

impl<S: ProductStore> ProductsRpc for ProductsService<S> {
    fn test_connection(&self) -> Result<(), DomainError> {
        match self.store.test_connection() {
            Ok(()) => {
                log::info!(target: self.log.target(), "Connection to Redis successfully established");
                Ok(())
            }
            Err(e) => {
                log::error!(target: self.log.target(), "Connection to Redis failed: {}", e);
                Err(e)
            }
        }
    }

    fn get(&self, product_id: &str) -> Result<Product, DomainError> {
        let product = self.store.get(product_id)?;
        log::info!(target: self.log.target(), "Product with id {} successfully retrieved", product_id);
        Ok(product)
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        let products = self.store.list()?;
        log::info!(target: self.log.target(), "{} products successfully retrieved", products.len());
        Ok(products)
    }

    fn create(&self, payload: Value) -> Result<Product, DomainError> {
        let product = load_product(&payload).map_err(DomainError::Validation)?;
        self.store.create(&product)?;
        log::info!(target: self.log.target(), "Product with id {} created successfully", product.id);
        Ok(product)
    }

    fn delete(&self, product_id: &str) -> Result<u64, DomainError> {
        let deleted = self.store.delete(product_id)?;
        log::info!(
            target: self.log.target(),
            "{} fields deleted successfully for product with id {}",
            deleted,
            product_id
        );
        Ok(deleted)
    }
}

impl<S: ProductStore> EventHandler for ProductsService<S> {
    fn handle(&self, event: &Event) -> Result<(), DomainError> {
        self.handle_order_created(event)
    }
}

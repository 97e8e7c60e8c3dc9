use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrderDetail, Order, OrderUpdate};
use crate::domain::ports::{OrderRepository, OrdersRpc};
use crate::telemetry::LogContext;

pub struct OrderService<R> {
    repo: R,
    log: LogContext,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, log: LogContext) -> Self {
        Self { repo, log }
    }
}

impl<R: OrderRepository> OrdersRpc for OrderService<R> {
    fn test_connection(&self) -> Result<(), DomainError> {
        match self.repo.test_connection() {
            Ok(()) => {
                log::info!(target: self.log.target(), "Connection to database successfully established");
                Ok(())
            }
            Err(e) => {
                log::error!(target: self.log.target(), "Connection to database failed: {}", e);
                Err(e)
            }
        }
    }

    fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        let orders = self
            .repo
            .list()
            .inspect_err(|e| log::error!(target: self.log.target(), "Error listing orders: {}", e))?;
        log::info!(target: self.log.target(), "{} orders listed", orders.len());
        Ok(orders)
    }

    fn get_order(&self, id: i32) -> Result<Order, DomainError> {
        match self.repo.find_by_id(id)? {
            Some(order) => {
                log::info!(target: self.log.target(), "Order with id {} successfully retrieved", id);
                Ok(order)
            }
            None => {
                log::error!(target: self.log.target(), "Order with id {} not found", id);
                Err(DomainError::OrderNotFound(id))
            }
        }
    }

    /// Persist a new order. The `order_created` event is recorded alongside
    /// it and delivered later by the outbox relay. Product existence is the
    /// caller's concern.
    fn create_order(&self, details: Vec<NewOrderDetail>) -> Result<Order, DomainError> {
        let order = self.repo.create(details)?;
        log::info!(target: self.log.target(), "Order with id {} successfully created", order.id);
        Ok(order)
    }

    fn update_order(&self, update: OrderUpdate) -> Result<Order, DomainError> {
        let order = self.repo.update(&update).inspect_err(|e| {
            log::error!(target: self.log.target(), "Failed to update order {}: {}", update.id, e)
        })?;
        log::info!(target: self.log.target(), "Order with id {} successfully updated", order.id);
        Ok(order)
    }

    fn delete_order(&self, id: i32) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            log::error!(target: self.log.target(), "Order with id {} not found", id);
            return Err(DomainError::OrderNotFound(id));
        }
        log::info!(target: self.log.target(), "Order with id {} deleted", id);
        Ok(())
    }

    fn delete_orders_with_product_id(&self, product_id: &str) -> Result<usize, DomainError> {
        let removed = self.repo.delete_with_product_id(product_id).inspect_err(|e| {
            log::error!(
                target: self.log.target(),
                "Failed to delete orders with product id {}. {}",
                product_id,
                e
            )
        })?;
        log::info!(
            target: self.log.target(),
            "{} orders with product id {} deleted to ensure data consistency",
            removed,
            product_id
        );
        Ok(removed)
    }
}

use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrderDetail, Order, OrderDetail};
use crate::domain::ports::{OrdersRpc, ProductsRpc};
use crate::domain::product::Product;
use crate::telemetry::LogContext;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailedOrderLine {
    pub detail: OrderDetail,
    pub product: Product,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailedOrder {
    pub id: i32,
    pub order_details: Vec<DetailedOrderLine>,
}

/// Composes the products and orders services behind the HTTP surface.
pub struct Gateway {
    products: Arc<dyn ProductsRpc>,
    orders: Arc<dyn OrdersRpc>,
    image_root: String,
    log: LogContext,
}

impl Gateway {
    pub fn new(
        products: Arc<dyn ProductsRpc>,
        orders: Arc<dyn OrdersRpc>,
        image_root: impl Into<String>,
        log: LogContext,
    ) -> Self {
        Self {
            products,
            orders,
            image_root: image_root.into(),
            log,
        }
    }

    pub fn test_connections(&self) -> Result<(), DomainError> {
        self.orders.test_connection()?;
        self.products.test_connection()
    }

    pub fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        self.products.list()
    }

    pub fn get_product(&self, product_id: &str) -> Result<Product, DomainError> {
        self.products.get(product_id)
    }

    /// Returns the id of the stored product.
    pub fn create_product(&self, product: &Product) -> Result<String, DomainError> {
        let created = self.products.create(serde_json::to_value(product)?)?;
        Ok(created.id)
    }

    /// Delete a product, then every order that references it. An unknown
    /// product is reported and nothing else is touched.
    pub fn delete_product(&self, product_id: &str) -> Result<usize, DomainError> {
        if self.products.delete(product_id)? == 0 {
            return Err(DomainError::ProductNotFound(product_id.to_string()));
        }
        let removed = self.orders.delete_orders_with_product_id(product_id)?;
        log::info!(
            target: self.log.target(),
            "Product {} deleted along with {} orders",
            product_id,
            removed
        );
        Ok(removed)
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.orders.list_orders()
    }

    /// Fetch an order with full product details and an image URL per line
    /// item.
    pub fn get_order(&self, order_id: i32) -> Result<DetailedOrder, DomainError> {
        let order = self.orders.get_order(order_id)?;

        let order_details = order
            .order_details
            .into_iter()
            .map(|detail| {
                let product = self.products.get(&detail.product_id)?;
                let image = format!("{}/{}.jpg", self.image_root, detail.product_id);
                Ok(DetailedOrderLine {
                    detail,
                    product,
                    image,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(DetailedOrder {
            id: order.id,
            order_details,
        })
    }

    /// Check every referenced product exists, then create the order.
    /// Returns the new order id.
    pub fn create_order(&self, details: Vec<NewOrderDetail>) -> Result<i32, DomainError> {
        for detail in &details {
            match self.products.get(&detail.product_id) {
                Ok(_) => {}
                Err(DomainError::ProductNotFound(_)) => {
                    log::warn!(
                        target: self.log.target(),
                        "Rejected order for unknown product {}",
                        detail.product_id
                    );
                    return Err(DomainError::UnknownProduct(detail.product_id.clone()));
                }
                Err(e) => return Err(e),
            }
        }

        let order = self.orders.create_order(details)?;
        Ok(order.id)
    }
}

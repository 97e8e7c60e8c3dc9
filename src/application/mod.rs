pub mod events;
pub mod gateway;
pub mod order_service;
pub mod products_service;

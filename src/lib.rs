pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
#[cfg(test)]
mod mock;
pub mod schema;
pub mod telemetry;

use std::error::Error;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use application::events::{EventBus, OutboxRelay, OutboxRelayConfig};
use application::gateway::Gateway;
use application::order_service::OrderService;
use application::products_service::ProductsService;
use config::Settings;
use domain::events::{ORDERS_SOURCE, ORDER_CREATED};
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::product_store::RedisProductStore;

pub use db::{create_pool, create_redis_pool, DbPool, RedisPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// The services of one deployment, wired over real stores.
pub struct Mesh {
    pub gateway: web::Data<Gateway>,
    pub relay: Arc<OutboxRelay>,
}

impl Mesh {
    pub fn new(settings: &Settings, pg: DbPool, redis: RedisPool) -> Self {
        let products = Arc::new(ProductsService::new(
            RedisProductStore::new(redis),
            telemetry::PRODUCTS,
        ));
        let order_repo = DieselOrderRepository::new(pg);
        let orders = Arc::new(OrderService::new(order_repo.clone(), telemetry::ORDERS));

        let mut bus = EventBus::new();
        bus.subscribe(ORDERS_SOURCE, ORDER_CREATED, products.clone());

        let relay = Arc::new(OutboxRelay::new(
            Arc::new(order_repo),
            Arc::new(bus),
            OutboxRelayConfig {
                poll_interval: settings.outbox_poll_interval,
                ..OutboxRelayConfig::default()
            },
            telemetry::OUTBOX,
        ));

        let gateway = web::Data::new(Gateway::new(
            products,
            orders,
            settings.product_image_root.clone(),
            telemetry::GATEWAY,
        ));

        Self { gateway, relay }
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    gateway: web::Data<Gateway>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(gateway.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((host.to_string(), port))?
    .run())
}

use std::io;

use airship_shop::config::Settings;
use airship_shop::{build_server, create_pool, create_redis_pool, run_migrations, telemetry, Mesh};
use dotenvy::dotenv;
use tokio::sync::watch;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    let _logs = telemetry::init();

    let settings = Settings::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pg = create_pool(&settings.database_url).map_err(io::Error::other)?;
    run_migrations(&pg).map_err(io::Error::other)?;
    let redis = create_redis_pool(&settings.redis_uri).map_err(io::Error::other)?;

    let mesh = Mesh::new(&settings, pg, redis);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay = mesh.relay.clone().start(shutdown_rx);

    log::info!("Starting server at http://{}:{}", settings.host, settings.port);
    let served = build_server(mesh.gateway, &settings.host, settings.port)?.await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = relay.await {
        log::error!("Outbox relay did not shut down cleanly: {}", e);
    }

    served
}

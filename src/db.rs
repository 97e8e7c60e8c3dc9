use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type RedisPool = r2d2::Pool<redis::Client>;

pub fn create_pool(database_url: &str) -> Result<DbPool, r2d2::Error> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

pub fn create_redis_pool(redis_uri: &str) -> Result<RedisPool, Box<dyn std::error::Error + Send + Sync>> {
    let client = redis::Client::open(redis_uri)?;
    Ok(r2d2::Pool::builder().build(client)?)
}

use std::collections::HashMap;

use redis::{Commands, Script};

use crate::db::RedisPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductStore;
use crate::domain::product::{Product, StockDecrement};

const KEY_PREFIX: &str = "products:";
/// Applied stock deliveries. Kept outside `products:*`, where any id is a
/// valid product.
const DELIVERIES_KEY: &str = "products_service:applied_deliveries";
const FIELDS: [&str; 5] = ["id", "title", "passenger_capacity", "maximum_speed", "in_stock"];
const LIST_BATCH: usize = 100;

/// KEYS: product hash, deliveries set. ARGV: signed delta, delivery key.
/// Returns `{0, 0}` for a repeated delivery, `{2, 0}` when the hash has no
/// `id`, otherwise `{1, new_stock}`.
const DECREMENT_ONCE: &str = r#"
local product = KEYS[1]
local deliveries = KEYS[2]

if redis.call('SISMEMBER', deliveries, ARGV[2]) == 1 then
    return {0, 0}
end

if redis.call('HEXISTS', product, 'id') == 0 then
    redis.call('SADD', deliveries, ARGV[2])
    return {2, 0}
end

local stock = redis.call('HINCRBY', product, 'in_stock', ARGV[1])
redis.call('SADD', deliveries, ARGV[2])
return {1, stock}
"#;

/// KEYS: product hash. ARGV: fields to remove. A hash without `id` is not a
/// product; it is dropped and 0 is returned.
const DELETE_PRODUCT: &str = r#"
local product = KEYS[1]

if redis.call('HEXISTS', product, 'id') == 0 then
    redis.call('DEL', product)
    return 0
end

return redis.call('HDEL', product, unpack(ARGV))
"#;

fn product_key(product_id: &str) -> String {
    format!("{KEY_PREFIX}{product_id}")
}

/// Decode a product hash. `None` means there is no product under the key.
fn from_hash(mut hash: HashMap<String, String>) -> Result<Option<Product>, DomainError> {
    let Some(id) = hash.remove("id") else {
        return Ok(None);
    };

    let mut int_field = |name: &str| -> Result<i64, DomainError> {
        let raw = hash
            .remove(name)
            .ok_or_else(|| DomainError::Internal(format!("product {id} has no {name}")))?;
        raw.parse()
            .map_err(|_| DomainError::Internal(format!("product {id} has a malformed {name}: {raw}")))
    };

    let passenger_capacity = int_field("passenger_capacity")?;
    let maximum_speed = int_field("maximum_speed")?;
    let in_stock = int_field("in_stock")?;
    let title = hash.remove("title").unwrap_or_default();

    Ok(Some(Product {
        id,
        title,
        passenger_capacity,
        maximum_speed,
        in_stock,
    }))
}

/// Products stored as Redis hashes under `products:{id}`.
pub struct RedisProductStore {
    pool: RedisPool,
}

impl RedisProductStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

impl ProductStore for RedisProductStore {
    fn get(&self, product_id: &str) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let conn: &mut redis::Connection = &mut conn;

        let hash: HashMap<String, String> = conn.hgetall(product_key(product_id))?;
        from_hash(hash)?.ok_or_else(|| DomainError::ProductNotFound(product_id.to_string()))
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let conn: &mut redis::Connection = &mut conn;

        let pattern = product_key("*");
        let keys: Vec<String> = conn.scan_match::<_, String>(&pattern)?.collect();

        let mut products = Vec::with_capacity(keys.len());
        for batch in keys.chunks(LIST_BATCH) {
            let mut pipe = redis::pipe();
            for key in batch {
                pipe.hgetall(key);
            }
            let hashes: Vec<HashMap<String, String>> = pipe.query(conn)?;
            for hash in hashes {
                // A key deleted between SCAN and HGETALL comes back empty.
                if let Some(product) = from_hash(hash)? {
                    products.push(product);
                }
            }
        }
        Ok(products)
    }

    fn create(&self, product: &Product) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let conn: &mut redis::Connection = &mut conn;

        let fields = [
            ("id", product.id.clone()),
            ("title", product.title.clone()),
            ("passenger_capacity", product.passenger_capacity.to_string()),
            ("maximum_speed", product.maximum_speed.to_string()),
            ("in_stock", product.in_stock.to_string()),
        ];
        conn.hset_multiple::<_, _, _, ()>(product_key(&product.id), &fields[..])?;
        Ok(())
    }

    fn decrement_stock(
        &self,
        product_id: &str,
        amount: i64,
        delivery: &str,
    ) -> Result<StockDecrement, DomainError> {
        let mut conn = self.pool.get()?;
        let conn: &mut redis::Connection = &mut conn;

        let result: Vec<i64> = Script::new(DECREMENT_ONCE)
            .key(product_key(product_id))
            .key(DELIVERIES_KEY)
            .arg(-amount)
            .arg(delivery)
            .invoke(conn)?;

        match result.as_slice() {
            [0, _] => Ok(StockDecrement::AlreadyApplied),
            [1, stock] => Ok(StockDecrement::Applied(*stock)),
            [2, _] => Ok(StockDecrement::UnknownProduct),
            other => Err(DomainError::Internal(format!(
                "unexpected stock decrement reply {other:?}"
            ))),
        }
    }

    fn delete(&self, product_id: &str) -> Result<u64, DomainError> {
        let mut conn = self.pool.get()?;
        let conn: &mut redis::Connection = &mut conn;

        let script = Script::new(DELETE_PRODUCT);
        let mut invocation = script.key(product_key(product_id));
        for field in FIELDS {
            invocation.arg(field);
        }
        Ok(invocation.invoke(conn)?)
    }

    fn test_connection(&self) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let conn: &mut redis::Connection = &mut conn;

        let _: HashMap<String, String> = conn.hgetall(product_key("*"))?;
        Ok(())
    }
}

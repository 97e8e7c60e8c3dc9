use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REDIS_URI: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_IMAGE_ROOT: &str = "http://example.com/airship/images";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub redis_uri: String,
    pub product_image_root: String,
    pub host: String,
    pub port: u16,
    pub outbox_poll_interval: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let redis_uri = lookup("REDIS_URI")
            .or_else(|| lookup("DEFAULT_REDIS_URI"))
            .unwrap_or_else(|| DEFAULT_REDIS_URI.to_string());
        let product_image_root = lookup("PRODUCT_IMAGE_ROOT")
            .map(|root| root.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_IMAGE_ROOT.to_string());
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_number(&lookup, "PORT", 8080)?;
        let poll_ms = parse_number(&lookup, "OUTBOX_POLL_INTERVAL_MS", 500)?;

        Ok(Self {
            database_url,
            redis_uri,
            product_image_root,
            host,
            port,
            outbox_poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

fn parse_number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

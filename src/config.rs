//! Process configuration read from the environment (and `.env` via dotenvy).

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub cors_origin: String,
    pub nats_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 8083)?,
            jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://127.0.0.1:5500".to_string()),
            nats_url: std::env::var("NATS_URL").ok().filter(|url| !url.is_empty()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

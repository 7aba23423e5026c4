use std::env;
use std::str::FromStr;

use crate::auth::password::DEFAULT_COST;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_SECRET: &str = "your-secret-key-here";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local tables; nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub max_connections: u32,
    pub backend: StoreBackend,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                lookup("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                lookup("DB_PASSWORD").unwrap_or_else(|| "password".to_string()),
                lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                lookup("DB_PORT").unwrap_or_else(|| "5432".to_string()),
                lookup("DB_NAME").unwrap_or_else(|| "campus_buzz".to_string()),
            )
        });

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set, falling back to the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let backend = match lookup("STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };

        Self {
            database_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            jwt_secret,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", DEFAULT_COST),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            backend,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Config: invalid {} '{}', using default", key, raw);
            default
        }),
        None => default,
    }
}

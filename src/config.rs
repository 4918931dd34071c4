use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub concurrency_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("APP_PORT", 3000);
        let max_connections = env_or("DB_MAX_CONNECTIONS", 10);
        let concurrency_limit = env_or("CONCURRENCY_LIMIT", 100);
        Ok(Self {
            port,
            database_url,
            host,
            max_connections,
            concurrency_limit,
        })
    }
}

/// Settings for the customer-side API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub submit_timeout_secs: u64,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("ORDERING_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string()),
            submit_timeout_secs: env_or("ORDER_SUBMIT_TIMEOUT_SECS", 15),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

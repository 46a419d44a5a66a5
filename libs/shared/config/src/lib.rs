use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub redis_url: Option<String>,
    pub store_backend: StoreBackend,
    pub store_timeout_ms: u64,
    pub booking_lock_ttl_ms: u64,
    pub booking_lock_wait_ms: u64,
    pub search_index_name: String,
    pub search_result_limit: usize,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            store_backend: StoreBackend::Redis,
            store_timeout_ms: 2_000,
            booking_lock_ttl_ms: 5_000,
            booking_lock_wait_ms: 3_000,
            search_index_name: "idx:slots".to_string(),
            search_result_limit: 1_000,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            store_backend: env_or("STORE_BACKEND", defaults.store_backend),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            booking_lock_ttl_ms: env_or("BOOKING_LOCK_TTL_MS", defaults.booking_lock_ttl_ms),
            booking_lock_wait_ms: env_or("BOOKING_LOCK_WAIT_MS", defaults.booking_lock_wait_ms),
            search_index_name: env::var("SEARCH_INDEX_NAME")
                .unwrap_or_else(|_| defaults.search_index_name.clone()),
            search_result_limit: env_or("SEARCH_RESULT_LIMIT", defaults.search_result_limit),
            port: env_or("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("REDIS_URL not set, falling back to {}", config.redis_url_or_default());
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        match self.store_backend {
            StoreBackend::Redis => self.redis_url.is_some(),
            StoreBackend::Memory => true,
        }
    }

    pub fn redis_url_or_default(&self) -> String {
        self.redis_url
            .clone()
            .unwrap_or_else(|| "redis://localhost:6379".to_string())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn booking_lock_ttl(&self) -> Duration {
        Duration::from_millis(self.booking_lock_ttl_ms)
    }

    pub fn booking_lock_wait(&self) -> Duration {
        Duration::from_millis(self.booking_lock_wait_ms)
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("redis".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search_index_name, "idx:slots");
        assert_eq!(config.store_timeout(), Duration::from_secs(2));
        assert!(!config.is_configured());
        assert_eq!(config.redis_url_or_default(), "redis://localhost:6379");
    }

    #[test]
    fn test_memory_backend_needs_no_redis() {
        let config = AppConfig {
            store_backend: StoreBackend::Memory,
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }
}

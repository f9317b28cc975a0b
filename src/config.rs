use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

/// Errors raised while loading configuration. These are fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Missing required config value: {0}")]
    Missing(&'static str),
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL (address and credentials)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Base URL of the subscription service, including its route prefix
    #[serde(default = "default_subscription_service_url")]
    pub subscription_service_url: String,

    /// Base URL of the user service
    #[serde(default = "default_user_service_url")]
    pub user_service_url: String,

    /// HS256 secret used to verify bearer tokens
    #[serde(default)]
    pub jwt_secret_key: Option<String>,

    /// Shared secret for service-to-service calls
    #[serde(default)]
    pub internal_secret: Option<String>,

    /// Maximum number of plans returned per recommendation
    #[serde(default = "default_recommend_count")]
    pub recommend_count: usize,

    /// Redis key holding the shared plan catalog
    #[serde(default = "default_catalog_cache_key", alias = "cache_key")]
    pub catalog_cache_key: String,

    #[serde(default = "default_catalog_ttl", alias = "cache_ttl_second")]
    pub catalog_cache_ttl_second: u64,

    #[serde(default = "default_recommend_ttl")]
    pub recommend_cache_ttl_second: u64,

    #[serde(default = "default_true")]
    pub catalog_cache_enabled: bool,

    #[serde(default = "default_true")]
    pub user_cache_enabled: bool,

    /// Timeout applied to every upstream HTTP call
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_second: u64,

    /// Number of users the precompute job processes at once
    #[serde(default = "default_precompute_concurrency")]
    pub precompute_concurrency: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_subscription_service_url() -> String {
    "http://sm-subs/sub".to_string()
}

fn default_user_service_url() -> String {
    "http://sm-user".to_string()
}

fn default_recommend_count() -> usize {
    1
}

fn default_catalog_cache_key() -> String {
    "SUB_PLANS".to_string()
}

fn default_catalog_ttl() -> u64 {
    60
}

fn default_recommend_ttl() -> u64 {
    86400
}

fn default_true() -> bool {
    true
}

fn default_upstream_timeout() -> u64 {
    10
}

fn default_precompute_concurrency() -> usize {
    1
}

impl Config {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from explicit key/value pairs, as the
    /// environment would supply them
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(pairs)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value that has no sensible fallback
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recommend_count == 0 {
            return Err(ConfigError::Invalid {
                field: "RECOMMEND_COUNT",
                reason: "must be a positive integer".to_string(),
            });
        }
        for (field, value) in [
            ("CATALOG_CACHE_TTL_SECOND", self.catalog_cache_ttl_second),
            ("RECOMMEND_CACHE_TTL_SECOND", self.recommend_cache_ttl_second),
            ("UPSTREAM_TIMEOUT_SECOND", self.upstream_timeout_second),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.precompute_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "PRECOMPUTE_CONCURRENCY",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.catalog_cache_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "CATALOG_CACHE_KEY",
                reason: "must not be empty".to_string(),
            });
        }
        for (field, url) in [
            ("SUBSCRIPTION_SERVICE_URL", &self.subscription_service_url),
            ("USER_SERVICE_URL", &self.user_service_url),
        ] {
            reqwest::Url::parse(url).map_err(|e| ConfigError::Invalid {
                field,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn recommend_count(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.recommend_count).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_cache_ttl_second)
    }

    pub fn recommend_ttl(&self) -> Duration {
        Duration::from_secs(self.recommend_cache_ttl_second)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_second)
    }

    /// The token secret, required by the HTTP server
    pub fn require_jwt_secret(&self) -> Result<&str, ConfigError> {
        non_empty(self.jwt_secret_key.as_deref()).ok_or(ConfigError::Missing("JWT_SECRET_KEY"))
    }

    /// The service-to-service secret, required by the precompute job
    pub fn require_internal_secret(&self) -> Result<&str, ConfigError> {
        non_empty(self.internal_secret.as_deref()).ok_or(ConfigError::Missing("INTERNAL_SECRET"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

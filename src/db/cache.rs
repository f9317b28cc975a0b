use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppResult;
use crate::models::{Plan, UserId};

/// Pattern matching every per-user recommendation key
pub const USER_RECOMMENDATION_PATTERN: &str = "user:*:recommendation";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Shared snapshot of the active plan catalog, stored under a configured name
    Catalog(String),
    UserRecommendation(UserId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Catalog(name) => write!(f, "{}", name),
            CacheKey::UserRecommendation(user_id) => write!(f, "user:{}:recommendation", user_id),
        }
    }
}

/// Key-value backend with per-key expiry
///
/// Implementations must never return a value past its expiry and only need
/// atomicity for single-key reads and writes.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Overwrites the key and resets its expiry
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;

    /// Lists live keys matching a glob pattern with `*` wildcards
    async fn keys(&self, pattern: &str) -> AppResult<Vec<String>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Typed view over a [`CacheStore`] holding the catalog and per-user recommendations
///
/// The cache is an optimization: read failures are reported as misses and
/// write failures are logged and swallowed.
#[derive(Clone)]
pub struct RecommendationCache {
    store: Arc<dyn CacheStore>,
    catalog_key: CacheKey,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn CacheStore>, catalog_key: impl Into<String>) -> Self {
        Self {
            store,
            catalog_key: CacheKey::Catalog(catalog_key.into()),
        }
    }

    pub fn catalog_key(&self) -> &CacheKey {
        &self.catalog_key
    }

    /// Retrieves and deserializes a value, treating any failure as a miss
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.store.get(&key.to_string()).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, backend = self.store.name(), error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Serializes and stores a value with an explicit TTL
    ///
    /// Returns whether the write reached the backend.
    pub async fn set<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) -> bool {
        if ttl.is_zero() {
            tracing::error!(key = %key, "Refusing cache write without expiry");
            return false;
        }

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return false;
            }
        };

        match self.store.set_ex(&key.to_string(), json, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, backend = self.store.name(), error = %e, "Cache write failed, continuing without caching");
                false
            }
        }
    }

    pub async fn get_user_recommendation(&self, user_id: UserId) -> Option<Vec<Plan>> {
        self.get(&CacheKey::UserRecommendation(user_id)).await
    }

    pub async fn set_user_recommendation(
        &self,
        user_id: UserId,
        plans: &[Plan],
        ttl: Duration,
    ) -> bool {
        self.set(&CacheKey::UserRecommendation(user_id), &plans, ttl)
            .await
    }

    pub async fn get_catalog(&self) -> Option<Vec<Plan>> {
        self.get(&self.catalog_key).await
    }

    pub async fn set_catalog(&self, plans: &[Plan], ttl: Duration) -> bool {
        self.set(&self.catalog_key, &plans, ttl).await
    }

    /// Lists every cached recommendation with its raw stored value
    pub async fn user_recommendation_entries(&self) -> AppResult<Vec<(String, Option<String>)>> {
        let mut keys = self.store.keys(USER_RECOMMENDATION_PATTERN).await?;
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.store.get(&key).await?;
            entries.push((key, value));
        }
        Ok(entries)
    }
}

/// Minimal glob matcher supporting `*` wildcards, as used by Redis `SCAN MATCH`
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !key.starts_with(first) || !key[first.len()..].ends_with(last) {
        return false;
    }

    let mut rest = &key[first.len()..key.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

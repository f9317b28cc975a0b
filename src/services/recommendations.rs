use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::{
    cached,
    config::Config,
    db::RecommendationCache,
    error::AppResult,
    models::{Holdings, Plan, PlanId, RecommendationOutcome, UserId},
    services::{
        diversity::DiversityFilter,
        upstream::{Credential, SubscriptionSource},
    },
};

/// Tunables for [`RecommendationService`]
///
/// The two flags select between the historical deployments: no caching at
/// all, catalog + per-user caching with force bypass, or per-user caching
/// only (fed by the precompute job).
#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub count: NonZeroUsize,
    pub catalog_ttl: Duration,
    pub recommend_ttl: Duration,
    pub catalog_cache_enabled: bool,
    pub user_cache_enabled: bool,
}

impl RecommendationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            count: config.recommend_count(),
            catalog_ttl: config.catalog_ttl(),
            recommend_ttl: config.recommend_ttl(),
            catalog_cache_enabled: config.catalog_cache_enabled,
            user_cache_enabled: config.user_cache_enabled,
        }
    }
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            count: NonZeroUsize::MIN,
            catalog_ttl: Duration::from_secs(60),
            recommend_ttl: Duration::from_secs(86400),
            catalog_cache_enabled: true,
            user_cache_enabled: true,
        }
    }
}

/// Recommends plans from providers a user does not subscribe to yet
#[derive(Clone)]
pub struct RecommendationService {
    source: Arc<dyn SubscriptionSource>,
    cache: RecommendationCache,
    filter: Arc<DiversityFilter>,
    settings: RecommendationSettings,
}

impl RecommendationService {
    pub fn new(
        source: Arc<dyn SubscriptionSource>,
        cache: RecommendationCache,
        settings: RecommendationSettings,
    ) -> Self {
        let filter = Arc::new(DiversityFilter::new(settings.count));
        Self::with_filter(source, cache, filter, settings)
    }

    /// Uses a caller-supplied filter, e.g. a seeded one
    pub fn with_filter(
        source: Arc<dyn SubscriptionSource>,
        cache: RecommendationCache,
        filter: Arc<DiversityFilter>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            source,
            cache,
            filter,
            settings,
        }
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    pub fn settings(&self) -> &RecommendationSettings {
        &self.settings
    }

    /// Recommends plans for one user
    ///
    /// A fresh per-user cache entry short-circuits everything unless
    /// `force_refresh` is set. Otherwise the user's subscriptions and the
    /// catalog are loaded, filtered, and a non-empty result is cached.
    /// Empty results are returned as [`RecommendationOutcome::NoRecommendation`]
    /// and never cached.
    #[instrument(skip(self, credential))]
    pub async fn recommend(
        &self,
        user_id: UserId,
        credential: &Credential,
        force_refresh: bool,
    ) -> AppResult<RecommendationOutcome> {
        if force_refresh {
            tracing::info!("Force recommendation triggered");
        } else if self.settings.user_cache_enabled {
            if let Some(plans) = self.cache.get_user_recommendation(user_id).await {
                tracing::info!("Returned cached recommendation");
                return Ok(RecommendationOutcome::Cached(plans));
            }
        }

        let holdings = self.fetch_holdings(credential).await?;
        let catalog = self.load_catalog(credential).await?;

        let plans = self.filter.filter(&holdings, &catalog);
        if plans.is_empty() {
            tracing::info!(
                catalog_size = catalog.len(),
                held_providers = holdings.providers.len(),
                "No available subscription plans to recommend"
            );
            return Ok(RecommendationOutcome::NoRecommendation);
        }

        if self.settings.user_cache_enabled {
            self.cache
                .set_user_recommendation(user_id, &plans, self.settings.recommend_ttl)
                .await;
        }

        tracing::info!(plan_ids = ?plan_ids(&plans), "Successfully recommended plans");
        Ok(RecommendationOutcome::Fresh(plans))
    }

    /// Fetches the plans and providers the credential's user holds right now
    pub async fn fetch_holdings(&self, credential: &Credential) -> AppResult<Holdings> {
        let subscriptions = self.source.fetch_user_subscriptions(credential).await?;
        Ok(Holdings::from_subscriptions(&subscriptions))
    }

    /// Returns the catalog from cache, fetching and caching it on a miss
    pub async fn load_catalog(&self, credential: &Credential) -> AppResult<Vec<Plan>> {
        if !self.settings.catalog_cache_enabled {
            return self.fetch_catalog(credential).await;
        }

        cached!(
            self.cache,
            self.cache.catalog_key().clone(),
            self.settings.catalog_ttl,
            async move { self.fetch_catalog(credential).await }
        )
    }

    /// Fetches the catalog from the subscription service, bypassing the cache
    pub async fn fetch_catalog(&self, credential: &Credential) -> AppResult<Vec<Plan>> {
        self.source.fetch_catalog(credential).await
    }

    /// Runs the diversity filter on already-loaded inputs
    pub fn select(&self, holdings: &Holdings, catalog: &[Plan]) -> Vec<Plan> {
        self.filter.filter(holdings, catalog)
    }
}

pub(crate) fn plan_ids(plans: &[Plan]) -> Vec<PlanId> {
    plans.iter().map(|p| p.id).collect()
}

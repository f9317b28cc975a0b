//! Warms the per-user recommendation cache for every known user, then lists
//! what ended up in the cache.

use std::sync::Arc;

use anyhow::Context;

use plan_recommend::{
    config::Config,
    db::{create_redis_client, RecommendationCache, RedisStore},
    services::{
        upstream::{build_http_client, HttpSubscriptionSource, HttpUserDirectory, StaticSecret},
        PrecomputeJob, RecommendationService, RecommendationSettings,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    plan_recommend::init_tracing();

    let config = Config::from_env().context("Invalid configuration")?;
    let credentials = Arc::new(StaticSecret::new(config.require_internal_secret()?));

    let redis_client = create_redis_client(&config.redis_url)?;
    let store = RedisStore::connect(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    let cache = RecommendationCache::new(Arc::new(store), config.catalog_cache_key.clone());

    let http_client = build_http_client(config.upstream_timeout())?;
    let source = HttpSubscriptionSource::new(
        http_client.clone(),
        config.subscription_service_url.clone(),
    );
    let directory = HttpUserDirectory::new(
        http_client,
        config.user_service_url.clone(),
        credentials.clone(),
    );

    let service = RecommendationService::new(
        Arc::new(source),
        cache.clone(),
        RecommendationSettings::from_config(&config),
    );
    let job = PrecomputeJob::new(service, Arc::new(directory), credentials)
        .with_concurrency(config.precompute_concurrency);

    let report = job.run().await;
    tracing::info!(?report, "Precompute complete");

    let entries = cache
        .user_recommendation_entries()
        .await
        .context("Failed to list cached recommendations")?;
    tracing::info!(entries = entries.len(), "Cached recommendations");
    for (key, value) in entries {
        tracing::info!(%key, value = value.as_deref().unwrap_or("<expired>"), "Cache entry");
    }

    Ok(())
}

use std::sync::Arc;

use anyhow::Context;

use plan_recommend::{
    config::Config,
    db::{create_redis_client, RecommendationCache, RedisStore},
    middleware::JwtVerifier,
    routes::{create_router, AppState},
    services::{
        upstream::{build_http_client, HttpSubscriptionSource},
        RecommendationService, RecommendationSettings,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    plan_recommend::init_tracing();

    let config = Config::from_env().context("Invalid configuration")?;
    let jwt = JwtVerifier::new(config.require_jwt_secret()?);

    let redis_client = create_redis_client(&config.redis_url)?;
    let store = RedisStore::connect(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    let cache = RecommendationCache::new(Arc::new(store), config.catalog_cache_key.clone());

    let http_client = build_http_client(config.upstream_timeout())?;
    let source = HttpSubscriptionSource::new(http_client, config.subscription_service_url.clone());

    let settings = RecommendationSettings::from_config(&config);
    tracing::info!(
        count = settings.count.get(),
        catalog_cache = settings.catalog_cache_enabled,
        user_cache = settings.user_cache_enabled,
        "Recommendation service configured"
    );
    let service = RecommendationService::new(Arc::new(source), cache, settings);

    let app = create_router(Arc::new(AppState::new(service, jwt)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

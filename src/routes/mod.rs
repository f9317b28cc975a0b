use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{request_id_middleware, JwtVerifier, RequestSpan},
    services::RecommendationService,
};

pub mod recommend;

/// Shared state handed to every handler
pub struct AppState {
    pub service: RecommendationService,
    pub jwt: JwtVerifier,
}

impl AppState {
    pub fn new(service: RecommendationService, jwt: JwtVerifier) -> Self {
        Self { service, jwt }
    }
}

impl FromRef<Arc<AppState>> for JwtVerifier {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.jwt.clone()
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", post(recommend::recommend))
        .with_state(state)
        .layer(
            // Outermost first: the request id must exist before the trace span is made
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan)),
        )
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is healthy."
    }))
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use plan_recommend::{
    db::{MemoryStore, RecommendationCache},
    error::{AppError, AppResult},
    middleware::{JwtVerifier, REQUEST_ID_HEADER},
    models::{Plan, UserSubscription},
    routes::{create_router, AppState},
    services::{
        upstream::{Credential, SubscriptionSource},
        DiversityFilter, RecommendationService, RecommendationSettings,
    },
};

const SECRET: &str = "api-test-secret-that-is-long-enough";

/// Subscription service stand-in that counts calls and remembers credentials
#[derive(Default)]
struct FakeSource {
    catalog: Vec<Plan>,
    holdings: Vec<UserSubscription>,
    fail_subscriptions: bool,
    catalog_calls: AtomicUsize,
    subscription_calls: AtomicUsize,
    seen_authorization: Mutex<Option<String>>,
}

impl FakeSource {
    fn new(catalog: Vec<Plan>, holdings: Vec<UserSubscription>) -> Self {
        Self {
            catalog,
            holdings,
            ..Default::default()
        }
    }

    fn subscription_calls(&self) -> usize {
        self.subscription_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SubscriptionSource for FakeSource {
    async fn fetch_catalog(&self, _credential: &Credential) -> AppResult<Vec<Plan>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.clone())
    }

    async fn fetch_user_subscriptions(
        &self,
        credential: &Credential,
    ) -> AppResult<Vec<UserSubscription>> {
        self.subscription_calls.fetch_add(1, Ordering::SeqCst);
        if let Credential::Bearer(authorization) = credential {
            *self.seen_authorization.lock().unwrap() = Some(authorization.clone());
        }
        if self.fail_subscriptions {
            return Err(AppError::UpstreamUnavailable(
                "Failed to fetch user subscription plans.".to_string(),
            ));
        }
        Ok(self.holdings.clone())
    }
}

fn catalog() -> Vec<Plan> {
    vec![
        Plan::new(1, "Basic", "A").with_fee(9900.0),
        Plan::new(2, "Premium", "A").with_fee(14900.0),
        Plan::new(3, "Basic", "B").with_fee(7900.0),
    ]
}

fn create_test_server(source: Arc<FakeSource>) -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let cache = RecommendationCache::new(store, "SUB_PLANS");
    let settings = RecommendationSettings::default();
    let filter = Arc::new(DiversityFilter::with_seed(settings.count, 11));
    let service = RecommendationService::with_filter(source, cache, filter, settings);

    let state = Arc::new(AppState::new(service, JwtVerifier::new(SECRET)));
    TestServer::new(create_router(state)).unwrap()
}

fn bearer(user_id: &str) -> HeaderValue {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let token = encode(
        &Header::default(),
        &json!({ "sub": user_id, "exp": exp }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Arc::new(FakeSource::default()));
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok", "message": "Server is healthy." }));
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_recommend_requires_token() {
    let source = Arc::new(FakeSource::new(catalog(), vec![]));
    let server = create_test_server(source.clone());

    let response = server.post("/recommend").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"].is_string());
    assert_eq!(source.subscription_calls(), 0);
}

#[tokio::test]
async fn test_recommend_rejects_invalid_token() {
    let server = create_test_server(Arc::new(FakeSource::new(catalog(), vec![])));
    let response = server
        .post("/recommend")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not.a.jwt"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recommend_excludes_subscribed_provider() {
    let source = Arc::new(FakeSource::new(
        catalog(),
        vec![UserSubscription::active(1, "A")],
    ));
    let server = create_test_server(source.clone());
    let authorization = bearer("5");

    let response = server
        .post("/recommend")
        .add_header(AUTHORIZATION, authorization.clone())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let recommends = body["recommends"].as_array().unwrap();
    assert_eq!(recommends.len(), 1);
    assert_eq!(recommends[0]["id"], 3);
    assert_eq!(recommends[0]["provider_name"], "B");

    let seen = source.seen_authorization.lock().unwrap().clone();
    assert_eq!(seen.as_deref(), authorization.to_str().ok());
}

#[tokio::test]
async fn test_recommend_no_recommendations() {
    let source = Arc::new(FakeSource::new(
        catalog(),
        vec![
            UserSubscription::active(2, "A"),
            UserSubscription::active(3, "B"),
        ],
    ));
    let server = create_test_server(source);

    let response = server
        .post("/recommend")
        .add_header(AUTHORIZATION, bearer("5"))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "no recommendations" }));
}

#[tokio::test]
async fn test_recommend_served_from_cache_until_forced() {
    let source = Arc::new(FakeSource::new(catalog(), vec![]));
    let server = create_test_server(source.clone());

    let first: Value = server
        .post("/recommend")
        .add_header(AUTHORIZATION, bearer("8"))
        .await
        .json();
    assert_eq!(source.subscription_calls(), 1);

    let second: Value = server
        .post("/recommend")
        .add_header(AUTHORIZATION, bearer("8"))
        .await
        .json();
    assert_eq!(first, second);
    assert_eq!(source.subscription_calls(), 1);

    let forced = server
        .post("/recommend")
        .add_query_param("force", "true")
        .add_header(AUTHORIZATION, bearer("8"))
        .await;
    forced.assert_status_ok();
    assert_eq!(source.subscription_calls(), 2);
    assert_eq!(source.catalog_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recommend_cache_is_per_user() {
    let source = Arc::new(FakeSource::new(catalog(), vec![]));
    let server = create_test_server(source.clone());

    for user in ["1", "2"] {
        server
            .post("/recommend")
            .add_header(AUTHORIZATION, bearer(user))
            .await
            .assert_status_ok();
    }
    assert_eq!(source.subscription_calls(), 2);
}

#[tokio::test]
async fn test_recommend_upstream_failure_is_bad_gateway() {
    let source = Arc::new(FakeSource {
        catalog: catalog(),
        fail_subscriptions: true,
        ..Default::default()
    });
    let server = create_test_server(source);

    let response = server
        .post("/recommend")
        .add_header(AUTHORIZATION, bearer("5"))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    response.assert_json(&json!({ "error": "Failed to fetch user subscription plans." }));
}

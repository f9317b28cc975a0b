//! Collaborator services the recommender reads from
//!
//! The subscription service supplies two independent data sources (the plan
//! catalog and a user's subscriptions); the user service lists every user for
//! batch runs. Both sit behind traits so the HTTP clients can be swapped for
//! fakes or other transports without touching the filtering logic.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{Plan, UserId, UserSubscription},
};

pub mod subscription;
pub mod user_directory;

pub use subscription::HttpSubscriptionSource;
pub use user_directory::HttpUserDirectory;

pub const INTERNAL_SECRET_HEADER: &str = "X-Internal-Secret";
pub const INTERNAL_USER_ID_HEADER: &str = "X-Internal-User-ID";

/// How a call to a collaborator authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// The caller's own `Authorization` header value, forwarded as-is
    Bearer(String),
    /// Shared-secret service call, optionally acting on behalf of one user
    Service {
        secret: String,
        user_id: Option<UserId>,
    },
}

impl Credential {
    /// Attaches the credential's headers to an outgoing request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::Bearer(authorization) => request.header(AUTHORIZATION, authorization),
            Credential::Service { secret, user_id } => {
                let request = request.header(INTERNAL_SECRET_HEADER, secret);
                match user_id {
                    Some(id) => request.header(INTERNAL_USER_ID_HEADER, id.to_string()),
                    None => request,
                }
            }
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
            Credential::Service { user_id, .. } => f
                .debug_struct("Service")
                .field("secret", &"***")
                .field("user_id", user_id)
                .finish(),
        }
    }
}

/// Supplies service-to-service credentials
pub trait CredentialProvider: Send + Sync {
    fn service_secret(&self) -> String;

    fn service_credential(&self, user_id: Option<UserId>) -> Credential {
        Credential::Service {
            secret: self.service_secret(),
            user_id,
        }
    }
}

/// Credential provider holding a secret injected from configuration
#[derive(Clone)]
pub struct StaticSecret(String);

impl StaticSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl CredentialProvider for StaticSecret {
    fn service_secret(&self) -> String {
        self.0.clone()
    }
}

/// Source of plan data: the shared catalog and each user's subscriptions
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// Fetch every active plan across all providers
    async fn fetch_catalog(&self, credential: &Credential) -> AppResult<Vec<Plan>>;

    /// Fetch the subscriptions of the user the credential identifies
    async fn fetch_user_subscriptions(
        &self,
        credential: &Credential,
    ) -> AppResult<Vec<UserSubscription>>;
}

/// Directory of every known user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_user_ids(&self) -> AppResult<Vec<UserId>>;
}

/// Builds the HTTP client shared by all collaborator calls
///
/// The timeout bounds the whole request, so a hung collaborator surfaces as
/// an ordinary upstream failure.
pub fn build_http_client(timeout: Duration) -> AppResult<HttpClient> {
    HttpClient::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(AppError::from)
}

/// Sends a request and decodes a JSON success body
///
/// Transport errors, timeouts, non-success statuses and undecodable bodies
/// all become [`AppError::UpstreamUnavailable`] carrying `context`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    context: &str,
) -> AppResult<T> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(error = %e, timeout = e.is_timeout(), "{}", context);
        AppError::UpstreamUnavailable(context.to_string())
    })?;

    let response = ensure_success(response, context).await?;

    response.json::<T>().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to decode upstream response: {}", context);
        AppError::UpstreamUnavailable(context.to_string())
    })
}

async fn ensure_success(response: Response, context: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(status = %status, body = %body, "{}", context);
    Err(AppError::UpstreamUnavailable(context.to_string()))
}

/// Joins a base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

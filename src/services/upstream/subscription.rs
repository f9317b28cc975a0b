use reqwest::Client as HttpClient;

use super::{fetch_json, join_url, Credential, SubscriptionSource};
use crate::{
    error::AppResult,
    models::{Plan, UserSubscription},
};

/// HTTP client for the subscription service
#[derive(Clone)]
pub struct HttpSubscriptionSource {
    http_client: HttpClient,
    base_url: String,
}

impl HttpSubscriptionSource {
    pub fn new(http_client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn plans_url(&self) -> String {
        join_url(&self.base_url, "plans")
    }

    fn user_plans_url(&self) -> String {
        join_url(&self.base_url, "plans/user")
    }
}

#[async_trait::async_trait]
impl SubscriptionSource for HttpSubscriptionSource {
    async fn fetch_catalog(&self, credential: &Credential) -> AppResult<Vec<Plan>> {
        let request = credential.apply(self.http_client.get(self.plans_url()));
        let plans: Vec<Plan> =
            fetch_json(request, "Failed to fetch available subscription plans.").await?;

        let fetched = plans.len();
        let active: Vec<Plan> = plans.into_iter().filter(|p| p.is_active).collect();
        if active.len() != fetched {
            tracing::debug!(
                dropped = fetched - active.len(),
                "Ignoring inactive plans in catalog response"
            );
        }

        tracing::info!(plans = active.len(), "Fetched plan catalog");
        Ok(active)
    }

    async fn fetch_user_subscriptions(
        &self,
        credential: &Credential,
    ) -> AppResult<Vec<UserSubscription>> {
        let request = credential.apply(self.http_client.get(self.user_plans_url()));
        let subscriptions: Vec<UserSubscription> =
            fetch_json(request, "Failed to fetch user subscription plans.").await?;

        tracing::debug!(
            subscriptions = subscriptions.len(),
            "Fetched user subscriptions"
        );
        Ok(subscriptions)
    }
}

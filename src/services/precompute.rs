use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::{
    models::{Plan, PlanId, UserId},
    services::{
        recommendations::{plan_ids, RecommendationService},
        upstream::{CredentialProvider, UserDirectory},
    },
};

/// What happened to one user during a batch run
#[derive(Debug, Clone, PartialEq)]
pub enum UserOutcome {
    Cached(Vec<PlanId>),
    /// Nothing eligible; no cache write
    Skipped,
    /// The user's subscriptions could not be fetched, or the write failed
    Failed,
}

/// Totals for a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecomputeReport {
    pub users: usize,
    pub cached: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PrecomputeReport {
    fn record(&mut self, outcome: &UserOutcome) {
        self.users += 1;
        match outcome {
            UserOutcome::Cached(_) => self.cached += 1,
            UserOutcome::Skipped => self.skipped += 1,
            UserOutcome::Failed => self.failed += 1,
        }
    }
}

/// Warms the per-user recommendation cache for every known user
///
/// Runs outside the request path. An unreachable user directory or catalog
/// means no per-user calls at all; a single user's failure only skips that
/// user. Re-running overwrites earlier entries with a fresh sample.
pub struct PrecomputeJob {
    service: RecommendationService,
    directory: Arc<dyn UserDirectory>,
    credentials: Arc<dyn CredentialProvider>,
    recommend_ttl: Duration,
    concurrency: usize,
}

impl PrecomputeJob {
    pub fn new(
        service: RecommendationService,
        directory: Arc<dyn UserDirectory>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let recommend_ttl = service.settings().recommend_ttl;
        Self {
            service,
            directory,
            credentials,
            recommend_ttl,
            concurrency: 1,
        }
    }

    /// Number of users processed at once; values below one are treated as one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self) -> PrecomputeReport {
        tracing::info!("Starting recommendation precompute");

        let user_ids = match self.directory.list_user_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list users, nothing to precompute");
                Vec::new()
            }
        };
        if user_ids.is_empty() {
            tracing::info!("No users to precompute");
            return PrecomputeReport::default();
        }

        // One catalog snapshot shared by the whole batch
        let catalog = match self
            .service
            .fetch_catalog(&self.credentials.service_credential(None))
            .await
        {
            Ok(plans) => plans,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    users = user_ids.len(),
                    "Failed to fetch plan catalog, aborting precompute"
                );
                return PrecomputeReport {
                    users: user_ids.len(),
                    failed: user_ids.len(),
                    ..Default::default()
                };
            }
        };

        let catalog = &catalog;
        let outcomes: Vec<UserOutcome> = stream::iter(user_ids)
            .map(|user_id| self.process_user(user_id, catalog))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = PrecomputeReport::default();
        for outcome in &outcomes {
            report.record(outcome);
        }

        tracing::info!(
            users = report.users,
            cached = report.cached,
            skipped = report.skipped,
            failed = report.failed,
            "Recommendation precompute finished"
        );
        report
    }

    async fn process_user(&self, user_id: UserId, catalog: &[Plan]) -> UserOutcome {
        let credential = self.credentials.service_credential(Some(user_id));
        let holdings = match self.service.fetch_holdings(&credential).await {
            Ok(holdings) => holdings,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Skipping user, subscriptions unavailable");
                return UserOutcome::Failed;
            }
        };

        let plans = self.service.select(&holdings, catalog);
        if plans.is_empty() {
            tracing::info!(user_id, "No recommendation for user");
            return UserOutcome::Skipped;
        }

        let written = self
            .service
            .cache()
            .set_user_recommendation(user_id, &plans, self.recommend_ttl)
            .await;
        if !written {
            return UserOutcome::Failed;
        }

        let ids = plan_ids(&plans);
        tracing::info!(user_id, plan_ids = ?ids, "Cached recommendation for user");
        UserOutcome::Cached(ids)
    }
}

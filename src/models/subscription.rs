use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Plan, PlanId};

/// Lifecycle state of a user's subscription
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    Expired,
    Suspended,
    #[serde(other)]
    Unknown,
}

/// The part of a subscribed plan the recommender looks at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRef {
    pub id: PlanId,
    pub provider_name: String,
}

/// A user's subscription as returned by `GET /plans/user`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSubscription {
    #[serde(default)]
    pub subscription_id: Option<i64>,
    /// Missing status means the collaborator already filtered to active rows
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub plan: PlanRef,
}

impl UserSubscription {
    pub fn active(plan_id: PlanId, provider_name: impl Into<String>) -> Self {
        Self {
            subscription_id: None,
            status: SubscriptionStatus::Active,
            plan: PlanRef {
                id: plan_id,
                provider_name: provider_name.into(),
            },
        }
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Plans and providers a user already holds; both exclude catalog entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holdings {
    pub plan_ids: HashSet<PlanId>,
    pub providers: HashSet<String>,
}

impl Holdings {
    pub fn new(
        plan_ids: impl IntoIterator<Item = PlanId>,
        providers: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            plan_ids: plan_ids.into_iter().collect(),
            providers: providers.into_iter().collect(),
        }
    }

    /// Builds holdings from active subscriptions only
    pub fn from_subscriptions(subscriptions: &[UserSubscription]) -> Self {
        let active = subscriptions.iter().filter(|s| s.is_active());
        Self::new(
            active.clone().map(|s| s.plan.id),
            active.map(|s| s.plan.provider_name.clone()),
        )
    }

    /// True when the plan must not be recommended to this user
    pub fn excludes(&self, plan: &Plan) -> bool {
        self.plan_ids.contains(&plan.id) || self.providers.contains(&plan.provider_name)
    }
}

use serde::{Deserialize, Serialize};

mod plan;
mod subscription;

pub use plan::{Plan, PlanId};
pub use subscription::{Holdings, PlanRef, SubscriptionStatus, UserSubscription};

/// Identifier of a user in the user service
pub type UserId = i64;

/// Message returned when a user has nothing left to recommend
pub const NO_RECOMMENDATIONS: &str = "no recommendations";

/// Result of a single recommendation call
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// Served from the per-user cache without any upstream calls
    Cached(Vec<Plan>),
    /// Computed on this call
    Fresh(Vec<Plan>),
    /// Every provider is already held or the catalog is empty
    NoRecommendation,
}

impl RecommendationOutcome {
    pub fn plans(&self) -> &[Plan] {
        match self {
            RecommendationOutcome::Cached(plans) | RecommendationOutcome::Fresh(plans) => plans,
            RecommendationOutcome::NoRecommendation => &[],
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, RecommendationOutcome::Cached(_))
    }
}

/// Body of `POST /recommend`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecommendResponse {
    Recommends { recommends: Vec<Plan> },
    Message { message: String },
}

impl From<RecommendationOutcome> for RecommendResponse {
    fn from(outcome: RecommendationOutcome) -> Self {
        match outcome {
            RecommendationOutcome::Cached(plans) | RecommendationOutcome::Fresh(plans) => {
                RecommendResponse::Recommends { recommends: plans }
            }
            RecommendationOutcome::NoRecommendation => RecommendResponse::Message {
                message: NO_RECOMMENDATIONS.to_string(),
            },
        }
    }
}

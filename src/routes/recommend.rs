use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::{AuthUser, RequestId},
    models::RecommendResponse,
    services::upstream::Credential,
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    pub force: Option<String>,
}

impl RecommendParams {
    /// Only a case-insensitive `true` forces a refresh
    pub fn force_refresh(&self) -> bool {
        self.force
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// Handler for `POST /recommend`
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    Query(params): Query<RecommendParams>,
) -> AppResult<Json<RecommendResponse>> {
    let force = params.force_refresh();
    tracing::info!(user_id = user.user_id, force, %request_id, "Recommendation requested");

    let outcome = state
        .service
        .recommend(user.user_id, &Credential::Bearer(user.authorization), force)
        .await?;

    Ok(Json(outcome.into()))
}

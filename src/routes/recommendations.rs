use axum::{extract::State, http::StatusCode, Extension, Json};

use super::{AppPath, AppQuery, AppState};
use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{RecommendationQuery, RecommendationResponse},
};

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    AppPath(user_id): AppPath<i64>,
    AppQuery(query): AppQuery<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let (filter, limit) = query.validate()?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        filter = %filter,
        limit,
        "Processing recommendation request"
    );

    let response = state
        .recommendations
        .get_recommendations(user_id, filter, limit)
        .await?;

    Ok(Json(response))
}

/// Drops every cached recommendation list of a user
pub async fn invalidate(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
) -> AppResult<StatusCode> {
    let removed = state.recommendations.invalidate_user(user_id).await?;
    tracing::info!(user_id, removed, "Recommendation cache cleared");
    Ok(StatusCode::NO_CONTENT)
}

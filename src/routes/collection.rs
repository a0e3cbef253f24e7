use axum::{extract::State, http::StatusCode, Extension, Json};

use super::{AppJson, AppPath, AppState};
use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{CollectionEntry, MediaType, UpsertCollectionEntry},
};

/// Adds an item to a user's collection or updates its status and rating
pub async fn upsert(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    AppPath((user_id, media_type, content_id)): AppPath<(i64, String, i64)>,
    AppJson(request): AppJson<UpsertCollectionEntry>,
) -> AppResult<Json<CollectionEntry>> {
    let media: MediaType = media_type.parse()?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        media = %media,
        content_id,
        "Saving collection entry"
    );

    let entry = state
        .collections
        .upsert_entry(user_id, media, content_id, request)
        .await?;

    Ok(Json(entry))
}

/// Removes an item from a user's collection
pub async fn remove(
    State(state): State<AppState>,
    AppPath((user_id, media_type, content_id)): AppPath<(i64, String, i64)>,
) -> AppResult<StatusCode> {
    let media: MediaType = media_type.parse()?;

    state
        .collections
        .remove_entry(user_id, media, content_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

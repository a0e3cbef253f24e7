use axum::{extract::State, Json};

use super::{AppPath, AppQuery, AppState};
use crate::{
    error::AppResult,
    models::{ActivityEntity, ActivityRecord, PageRequest},
};

/// Lists the activity history of one entity, newest first
pub async fn list(
    State(state): State<AppState>,
    AppPath((entity_type, entity_id)): AppPath<(String, i64)>,
    AppQuery(page): AppQuery<PageRequest>,
) -> AppResult<Json<Vec<ActivityRecord>>> {
    let entity: ActivityEntity = entity_type.parse()?;
    let records = state.activity.list(entity, entity_id, page).await?;
    Ok(Json(records))
}

use std::sync::Arc;

use serde_json::json;

use super::{activity_log::ActivityLogger, recommendations::RecommendationService};
use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{
        ActivityAction, ActivityEntity, CollectionEntry, MediaType, NewActivity,
        UpsertCollectionEntry,
    },
};

/// Adds, updates and removes items of a user's collection
///
/// Every successful change drops the user's cached recommendations and leaves a
/// trace in the activity log. Both follow-ups are best-effort.
pub struct CollectionService {
    store: Arc<dyn CatalogStore>,
    recommendations: Arc<RecommendationService>,
    activity: Arc<ActivityLogger>,
}

impl CollectionService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        recommendations: Arc<RecommendationService>,
        activity: Arc<ActivityLogger>,
    ) -> Self {
        Self {
            store,
            recommendations,
            activity,
        }
    }

    pub async fn upsert_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
        request: UpsertCollectionEntry,
    ) -> AppResult<CollectionEntry> {
        request.validate()?;

        let (exists, current_ids) = tokio::try_join!(
            self.store.content_exists(media, content_id),
            self.store.collection_ids(user_id, media)
        )?;

        if !exists {
            return Err(AppError::NotFound(format!("{} {}", media, content_id)));
        }

        let action = if current_ids.contains(&content_id) {
            ActivityAction::Updated
        } else {
            ActivityAction::Created
        };

        let entry = self
            .store
            .upsert_collection_entry(user_id, media, content_id, request.status, request.rating)
            .await?;

        tracing::info!(
            user_id,
            media = %media,
            content_id,
            status = %entry.status,
            rating = ?entry.rating,
            "Collection entry saved"
        );

        self.after_change(user_id, media, content_id, action, json!({
            "status": entry.status,
            "rating": entry.rating,
        }))
        .await;

        Ok(entry)
    }

    pub async fn remove_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
    ) -> AppResult<()> {
        let removed = self
            .store
            .remove_collection_entry(user_id, media, content_id)
            .await?;

        if !removed {
            return Err(AppError::NotFound(format!(
                "{} {} is not in the collection of user {}",
                media, content_id, user_id
            )));
        }

        tracing::info!(user_id, media = %media, content_id, "Collection entry removed");

        self.after_change(
            user_id,
            media,
            content_id,
            ActivityAction::Deleted,
            json!({}),
        )
        .await;

        Ok(())
    }

    async fn after_change(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
        action: ActivityAction,
        mut details: serde_json::Value,
    ) {
        if let Err(e) = self.recommendations.invalidate_user(user_id).await {
            tracing::warn!(error = %e, user_id, "Failed to invalidate cached recommendations");
        }

        details["media_type"] = json!(media);
        details["content_id"] = json!(content_id);

        self.activity
            .record(NewActivity {
                entity: ActivityEntity::UserCollection,
                entity_id: user_id,
                actor_id: Some(user_id),
                action,
                details,
            })
            .await;
    }
}

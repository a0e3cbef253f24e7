use std::sync::Arc;

use crate::{
    db::ActivityStore,
    error::AppResult,
    models::{ActivityEntity, ActivityRecord, NewActivity, PageRequest},
};

/// Writes and reads the admin activity log
pub struct ActivityLogger {
    store: Arc<dyn ActivityStore>,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Appends an entry; failures are logged and swallowed
    pub async fn record(&self, activity: NewActivity) {
        let entity = activity.entity;
        let entity_id = activity.entity_id;
        let action = activity.action;

        match self.store.append(activity).await {
            Ok(record) => tracing::debug!(
                id = record.id,
                entity = %entity,
                entity_id,
                action = action.as_str(),
                "Activity recorded"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                entity = %entity,
                entity_id,
                action = action.as_str(),
                "Failed to record activity"
            ),
        }
    }

    /// One page of the entity's history, newest first
    pub async fn list(
        &self,
        entity: ActivityEntity,
        entity_id: i64,
        page: PageRequest,
    ) -> AppResult<Vec<ActivityRecord>> {
        let (limit, offset) = page.resolve()?;
        self.store.list(entity, entity_id, limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockActivityStore;
    use crate::error::AppError;
    use crate::models::ActivityAction;
    use chrono::Utc;
    use mockall::predicate::eq;
    use serde_json::json;

    fn new_activity() -> NewActivity {
        NewActivity {
            entity: ActivityEntity::Anime,
            entity_id: 12,
            actor_id: Some(1),
            action: ActivityAction::Updated,
            details: json!({ "field": "title" }),
        }
    }

    #[tokio::test]
    async fn test_record_appends() {
        let mut store = MockActivityStore::new();
        store
            .expect_append()
            .times(1)
            .withf(|activity| activity.entity_id == 12)
            .returning(|activity| {
                Ok(ActivityRecord {
                    id: 1,
                    entity: activity.entity,
                    entity_id: activity.entity_id,
                    actor_id: activity.actor_id,
                    action: activity.action,
                    details: activity.details,
                    created_at: Utc::now(),
                })
            });

        ActivityLogger::new(Arc::new(store))
            .record(new_activity())
            .await;
    }

    #[tokio::test]
    async fn test_record_swallows_store_errors() {
        let mut store = MockActivityStore::new();
        store
            .expect_append()
            .times(1)
            .returning(|_| Err(AppError::Internal("insert failed".to_string())));

        // Must not panic or propagate
        ActivityLogger::new(Arc::new(store))
            .record(new_activity())
            .await;
    }

    #[tokio::test]
    async fn test_list_passes_resolved_page() {
        let mut store = MockActivityStore::new();
        store
            .expect_list()
            .with(eq(ActivityEntity::Manga), eq(3), eq(20), eq(40))
            .times(1)
            .returning(|_, _, _, _| Ok(vec![]));

        let logger = ActivityLogger::new(Arc::new(store));
        let page = PageRequest {
            limit: None,
            offset: Some(40),
        };
        let records = logger.list(ActivityEntity::Manga, 3, page).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_list_rejects_bad_page_before_querying() {
        let mut store = MockActivityStore::new();
        store.expect_list().never();

        let logger = ActivityLogger::new(Arc::new(store));
        let page = PageRequest {
            limit: Some(0),
            offset: None,
        };
        let result = logger.list(ActivityEntity::Manga, 3, page).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}

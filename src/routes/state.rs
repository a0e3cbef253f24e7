use std::sync::Arc;

use crate::{
    db::{ActivityStore, Cache, CatalogStore},
    services::{ActivityLogger, CollectionService, RecommendationService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub cache: Cache,
    pub recommendations: Arc<RecommendationService>,
    pub collections: Arc<CollectionService>,
    pub activity: Arc<ActivityLogger>,
}

impl AppState {
    /// Wires the services on top of the given stores and cache
    pub fn new(
        store: Arc<dyn CatalogStore>,
        activity_store: Arc<dyn ActivityStore>,
        cache: Cache,
        recommendation_cache_ttl: u64,
    ) -> Self {
        let recommendations = Arc::new(RecommendationService::new(
            store.clone(),
            cache.clone(),
            recommendation_cache_ttl,
        ));
        let activity = Arc::new(ActivityLogger::new(activity_store));
        let collections = Arc::new(CollectionService::new(
            store.clone(),
            recommendations.clone(),
            activity.clone(),
        ));

        Self {
            store,
            cache,
            recommendations,
            collections,
            activity,
        }
    }
}

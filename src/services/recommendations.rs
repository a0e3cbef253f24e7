use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use super::{
    scoring::score_candidates,
    tag_weights::{extract_tag_weights, top_tags},
};
use crate::{
    cached,
    db::{Cache, CacheKey, CatalogStore},
    error::AppResult,
    models::{MediaFilter, MediaType, RecommendationResponse, TaggedEntry},
};

/// Number of heaviest tags a candidate must match at least one of
pub const TOP_TAG_FILTER: usize = 20;
/// Number of tags reported back as the user's profile
pub const REPORTED_TOP_TAGS: usize = 10;
/// Upper bound on candidates read per media type
pub const CANDIDATE_POOL_SIZE: i64 = 500;

/// What the collection reader returns for one media type
struct CollectionSnapshot {
    media: MediaType,
    tagged: Vec<TaggedEntry>,
    all_ids: Vec<i64>,
}

/// Generates tag-weighted recommendations from a user's collection
///
/// Results are cached per (user, media filter, limit) for `cache_ttl` seconds.
/// Nothing here invalidates the cache on its own; callers that mutate a
/// collection call [`RecommendationService::invalidate_user`].
pub struct RecommendationService {
    store: Arc<dyn CatalogStore>,
    cache: Cache,
    cache_ttl: u64,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn CatalogStore>, cache: Cache, cache_ttl: u64) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Returns the cached list when present, computing and caching it otherwise
    pub async fn get_recommendations(
        &self,
        user_id: i64,
        filter: MediaFilter,
        limit: usize,
    ) -> AppResult<RecommendationResponse> {
        let key = CacheKey::Recommendations {
            user_id,
            filter,
            limit,
        };

        cached!(
            self.cache,
            key,
            self.cache_ttl,
            self.compute(user_id, filter, limit)
        )
    }

    /// Drops every cached list of the user, returning how many were removed
    pub async fn invalidate_user(&self, user_id: i64) -> AppResult<u64> {
        let removed = self
            .cache
            .invalidate_prefix(&CacheKey::recommendations_prefix(user_id))
            .await?;

        tracing::debug!(user_id, removed, "Invalidated cached recommendations");
        Ok(removed)
    }

    async fn compute(
        &self,
        user_id: i64,
        filter: MediaFilter,
        limit: usize,
    ) -> AppResult<RecommendationResponse> {
        let start = Instant::now();

        // 1. Read the collection for every requested media type
        let snapshots = self.read_collections(user_id, filter).await?;

        let tagged: Vec<TaggedEntry> = snapshots
            .iter()
            .flat_map(|snapshot| snapshot.tagged.iter().cloned())
            .collect();
        let total_analyzed = tagged.len();

        // 2. Build the taste profile
        let weights = extract_tag_weights(&tagged);
        if weights.is_empty() {
            tracing::info!(
                user_id,
                filter = %filter,
                total_analyzed,
                "No tag weights for user, returning empty recommendations"
            );
            return Ok(RecommendationResponse::empty(total_analyzed));
        }

        let filter_tags: Vec<String> = top_tags(&weights, TOP_TAG_FILTER)
            .into_iter()
            .map(|t| t.tag)
            .collect();

        // 3. Gather candidates outside the collection
        let mut exclude: HashSet<(MediaType, i64)> = HashSet::new();
        let mut candidates = Vec::new();

        for snapshot in &snapshots {
            exclude.extend(snapshot.all_ids.iter().map(|id| (snapshot.media, *id)));

            let found = self
                .store
                .find_candidates(
                    snapshot.media,
                    &filter_tags,
                    &snapshot.all_ids,
                    CANDIDATE_POOL_SIZE,
                )
                .await?;
            candidates.extend(found);
        }

        let candidate_count = candidates.len();

        // 4. Score and rank
        let recommendations = score_candidates(candidates, &weights, &exclude, limit);

        tracing::info!(
            user_id,
            filter = %filter,
            total_analyzed,
            tags = weights.len(),
            candidates = candidate_count,
            returned = recommendations.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations computed"
        );

        Ok(RecommendationResponse {
            recommendations,
            user_top_tags: top_tags(&weights, REPORTED_TOP_TAGS),
            total_analyzed,
        })
    }

    async fn read_collections(
        &self,
        user_id: i64,
        filter: MediaFilter,
    ) -> AppResult<Vec<CollectionSnapshot>> {
        match filter {
            MediaFilter::Anime => Ok(vec![self.read_collection(user_id, MediaType::Anime).await?]),
            MediaFilter::Manga => Ok(vec![self.read_collection(user_id, MediaType::Manga).await?]),
            MediaFilter::All => {
                let (anime, manga) = tokio::try_join!(
                    self.read_collection(user_id, MediaType::Anime),
                    self.read_collection(user_id, MediaType::Manga)
                )?;
                Ok(vec![anime, manga])
            }
        }
    }

    async fn read_collection(
        &self,
        user_id: i64,
        media: MediaType,
    ) -> AppResult<CollectionSnapshot> {
        let (tagged, all_ids) = tokio::try_join!(
            self.store.tagged_collection(user_id, media),
            self.store.collection_ids(user_id, media)
        )?;

        Ok(CollectionSnapshot {
            media,
            tagged,
            all_ids,
        })
    }
}

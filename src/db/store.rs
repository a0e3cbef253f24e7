use crate::{
    error::AppResult,
    models::{
        ActivityEntity, ActivityRecord, CatalogCandidate, CollectionEntry, CollectionStatus,
        MediaType, NewActivity, TaggedEntry,
    },
};

/// Read and write access to the catalog and user collections
///
/// Every method takes a [`MediaType`]; implementations pick their tables from
/// it rather than from caller-provided strings.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Entries of the user's collection whose status feeds the taste profile,
    /// each with the genre and business names of its content
    async fn tagged_collection(&self, user_id: i64, media: MediaType)
        -> AppResult<Vec<TaggedEntry>>;

    /// Ids of every item in the user's collection, whatever its status
    async fn collection_ids(&self, user_id: i64, media: MediaType) -> AppResult<Vec<i64>>;

    /// Catalog items carrying at least one of `tags`, skipping `exclude`
    ///
    /// Results are ordered by average rating descending then id, capped at `pool_size`.
    async fn find_candidates(
        &self,
        media: MediaType,
        tags: &[String],
        exclude: &[i64],
        pool_size: i64,
    ) -> AppResult<Vec<CatalogCandidate>>;

    async fn content_exists(&self, media: MediaType, content_id: i64) -> AppResult<bool>;

    /// Inserts the entry or replaces status and rating of the existing one
    async fn upsert_collection_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
        status: CollectionStatus,
        rating: Option<f64>,
    ) -> AppResult<CollectionEntry>;

    /// Returns false when there was nothing to remove
    async fn remove_collection_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
    ) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

/// Append-only admin activity log
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append(&self, activity: NewActivity) -> AppResult<ActivityRecord>;

    /// Newest first
    async fn list(
        &self,
        entity: ActivityEntity,
        entity_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ActivityRecord>>;
}

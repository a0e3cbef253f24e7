#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use catalog_admin::{
    db::{ActivityStore, CatalogStore},
    error::{AppError, AppResult},
    models::{
        ActivityEntity, ActivityRecord, CatalogCandidate, CollectionEntry, CollectionStatus,
        MediaType, NewActivity, TaggedEntry,
    },
};

struct CatalogItem {
    title: String,
    tags: Vec<String>,
    average_rating: f64,
    review_count: i64,
}

#[derive(Default)]
struct Inner {
    catalog: HashMap<(MediaType, i64), CatalogItem>,
    collection: BTreeMap<(i64, MediaType, i64), CollectionEntry>,
    activity: Vec<ActivityRecord>,
}

/// Catalog and activity store kept in memory for HTTP-level tests
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_content(
        &self,
        media: MediaType,
        content_id: i64,
        tags: &[&str],
        average_rating: f64,
        review_count: i64,
    ) {
        self.inner.write().await.catalog.insert(
            (media, content_id),
            CatalogItem {
                title: format!("{} #{}", media, content_id),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                average_rating,
                review_count,
            },
        );
    }

    /// Makes `ping` fail, as an unreachable database would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn activity_count(&self) -> usize {
        self.inner.read().await.activity.len()
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn tagged_collection(
        &self,
        user_id: i64,
        media: MediaType,
    ) -> AppResult<Vec<TaggedEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection
            .values()
            .filter(|e| e.user_id == user_id && e.media_type == media)
            .filter(|e| e.status.counts_toward_taste())
            .map(|e| TaggedEntry {
                media_type: media,
                content_id: e.content_id,
                rating: e.rating,
                tags: inner
                    .catalog
                    .get(&(media, e.content_id))
                    .map(|item| item.tags.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn collection_ids(&self, user_id: i64, media: MediaType) -> AppResult<Vec<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection
            .values()
            .filter(|e| e.user_id == user_id && e.media_type == media)
            .map(|e| e.content_id)
            .collect())
    }

    async fn find_candidates(
        &self,
        media: MediaType,
        tags: &[String],
        exclude: &[i64],
        pool_size: i64,
    ) -> AppResult<Vec<CatalogCandidate>> {
        let inner = self.inner.read().await;
        let mut candidates: Vec<CatalogCandidate> = inner
            .catalog
            .iter()
            .filter(|((m, id), _)| *m == media && !exclude.contains(id))
            .filter(|(_, item)| item.tags.iter().any(|t| tags.contains(&normalize(t))))
            .map(|((m, id), item)| CatalogCandidate {
                media_type: *m,
                content_id: *id,
                title: item.title.clone(),
                image: None,
                average_rating: item.average_rating,
                review_count: item.review_count,
                tags: item.tags.iter().map(|t| normalize(t)).collect(),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        candidates.truncate(pool_size.max(0) as usize);
        Ok(candidates)
    }

    async fn content_exists(&self, media: MediaType, content_id: i64) -> AppResult<bool> {
        Ok(self
            .inner
            .read()
            .await
            .catalog
            .contains_key(&(media, content_id)))
    }

    async fn upsert_collection_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
        status: CollectionStatus,
        rating: Option<f64>,
    ) -> AppResult<CollectionEntry> {
        let entry = CollectionEntry {
            user_id,
            media_type: media,
            content_id,
            status,
            rating,
            updated_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .collection
            .insert((user_id, media, content_id), entry.clone());
        Ok(entry)
    }

    async fn remove_collection_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
    ) -> AppResult<bool> {
        Ok(self
            .inner
            .write()
            .await
            .collection
            .remove(&(user_id, media, content_id))
            .is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("database unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn append(&self, activity: NewActivity) -> AppResult<ActivityRecord> {
        let mut inner = self.inner.write().await;
        let record = ActivityRecord {
            id: inner.activity.len() as i64 + 1,
            entity: activity.entity,
            entity_id: activity.entity_id,
            actor_id: activity.actor_id,
            action: activity.action,
            details: activity.details,
            created_at: Utc::now(),
        };
        inner.activity.push(record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        entity: ActivityEntity,
        entity_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ActivityRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<ActivityRecord> = inner
            .activity
            .iter()
            .filter(|r| r.entity == entity && r.entity_id == entity_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

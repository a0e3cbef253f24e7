use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use super::store::{ActivityStore, CatalogStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        ActivityEntity, ActivityRecord, CatalogCandidate, CollectionEntry, CollectionStatus,
        MediaType, NewActivity, TaggedEntry,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct TaggedRow {
    content_id: i64,
    rating: Option<f64>,
    tag: Option<String>,
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: i64,
    title: String,
    image: Option<String>,
    average_rating: f64,
    review_count: i64,
    tags: Vec<String>,
}

#[derive(Debug, FromRow)]
struct CollectionRow {
    user_id: i64,
    media_type: String,
    content_id: i64,
    status: String,
    rating: Option<f64>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CollectionRow> for CollectionEntry {
    type Error = AppError;

    fn try_from(row: CollectionRow) -> Result<Self, Self::Error> {
        Ok(CollectionEntry {
            user_id: row.user_id,
            media_type: row.media_type.parse()?,
            content_id: row.content_id,
            status: row.status.parse()?,
            rating: row.rating,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: i64,
    entity_type: String,
    entity_id: i64,
    actor_id: Option<i64>,
    action: String,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityRecord {
            id: row.id,
            entity: row.entity_type.parse()?,
            entity_id: row.entity_id,
            actor_id: row.actor_id,
            action: row.action.parse()?,
            details: row.details,
            created_at: row.created_at,
        })
    }
}

/// Groups joined (content, rating, tag) rows into one entry per content id
///
/// Rows must arrive ordered by content id. A content without any tag yields an
/// entry with an empty tag list.
fn group_tagged_rows(media: MediaType, rows: Vec<TaggedRow>) -> Vec<TaggedEntry> {
    let mut entries: Vec<TaggedEntry> = Vec::new();

    for row in rows {
        let same_content = entries
            .last()
            .is_some_and(|entry| entry.content_id == row.content_id);

        if !same_content {
            entries.push(TaggedEntry {
                media_type: media,
                content_id: row.content_id,
                rating: row.rating,
                tags: Vec::new(),
            });
        }

        if let (Some(tag), Some(entry)) = (row.tag, entries.last_mut()) {
            entry.tags.push(tag);
        }
    }

    entries
}

/// SQL counterpart of `normalize_tag`: lowercase, all surrounding whitespace
/// removed. Plain `TRIM` only strips spaces, so tabs or newlines in a genre
/// name would never match the weight map.
const NORMALIZED_TAG_SQL: &str =
    "LOWER(REGEXP_REPLACE(tag, '^[[:space:]]+|[[:space:]]+$', '', 'g'))";

/// Subquery yielding `(content_id, tag)` for every genre and business link
fn tag_source_sql(media: MediaType) -> String {
    let tables = media.tables();
    format!(
        r#"
        SELECT l.{fk} AS content_id, g.name AS tag
        FROM {genre_link} l
        JOIN genres g ON g.id = l.genre_id
        UNION ALL
        SELECT l.{fk} AS content_id, b.name AS tag
        FROM {business_link} l
        JOIN business b ON b.id = l.business_id
        "#,
        fk = tables.content_fk,
        genre_link = tables.genre_link,
        business_link = tables.business_link,
    )
}

/// PostgreSQL implementation of the catalog and activity stores
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn tagged_collection(
        &self,
        user_id: i64,
        media: MediaType,
    ) -> AppResult<Vec<TaggedEntry>> {
        let statuses: Vec<String> = CollectionStatus::ALL
            .iter()
            .filter(|status| status.counts_toward_taste())
            .map(|status| status.as_str().to_string())
            .collect();

        let sql = format!(
            r#"
            SELECT c.content_id, c.rating, t.tag
            FROM user_collection c
            LEFT JOIN ({tags}) t ON t.content_id = c.content_id
            WHERE c.user_id = $1 AND c.media_type = $2 AND c.status = ANY($3)
            ORDER BY c.content_id
            "#,
            tags = tag_source_sql(media),
        );

        let rows = sqlx::query_as::<_, TaggedRow>(&sql)
            .bind(user_id)
            .bind(media.as_str())
            .bind(&statuses)
            .fetch_all(&self.pool)
            .await?;

        Ok(group_tagged_rows(media, rows))
    }

    async fn collection_ids(&self, user_id: i64, media: MediaType) -> AppResult<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT content_id
            FROM user_collection
            WHERE user_id = $1 AND media_type = $2
            "#,
        )
        .bind(user_id)
        .bind(media.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn find_candidates(
        &self,
        media: MediaType,
        tags: &[String],
        exclude: &[i64],
        pool_size: i64,
    ) -> AppResult<Vec<CatalogCandidate>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            WITH tagged AS (
                SELECT content_id, {normalized} AS tag FROM ({tags}) src
            ),
            matched AS (
                SELECT DISTINCT content_id FROM tagged WHERE tag = ANY($1)
            )
            SELECT c.id,
                   c.title,
                   c.image,
                   COALESCE(c.average_rating, 0)::FLOAT8 AS average_rating,
                   c.review_count::INT8 AS review_count,
                   COALESCE(ARRAY_AGG(t.tag) FILTER (WHERE t.tag <> ''), '{{}}') AS tags
            FROM {content} c
            JOIN matched m ON m.content_id = c.id
            LEFT JOIN tagged t ON t.content_id = c.id
            WHERE c.published AND NOT (c.id = ANY($2))
            GROUP BY c.id
            ORDER BY average_rating DESC, c.id ASC
            LIMIT $3
            "#,
            normalized = NORMALIZED_TAG_SQL,
            tags = tag_source_sql(media),
            content = media.tables().content,
        );

        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(tags)
            .bind(exclude)
            .bind(pool_size)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            media = %media,
            candidates = rows.len(),
            "Loaded recommendation candidates"
        );

        Ok(rows
            .into_iter()
            .map(|row| CatalogCandidate {
                media_type: media,
                content_id: row.id,
                title: row.title,
                image: row.image,
                average_rating: row.average_rating,
                review_count: row.review_count,
                tags: row.tags,
            })
            .collect())
    }

    async fn content_exists(&self, media: MediaType, content_id: i64) -> AppResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            media.tables().content
        );

        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(content_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn upsert_collection_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
        status: CollectionStatus,
        rating: Option<f64>,
    ) -> AppResult<CollectionEntry> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r#"
            INSERT INTO user_collection (user_id, media_type, content_id, status, rating, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, media_type, content_id)
            DO UPDATE SET status = EXCLUDED.status,
                          rating = EXCLUDED.rating,
                          updated_at = NOW()
            RETURNING user_id, media_type, content_id, status, rating, updated_at
            "#,
        )
        .bind(user_id)
        .bind(media.as_str())
        .bind(content_id)
        .bind(status.as_str())
        .bind(rating)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn remove_collection_entry(
        &self,
        user_id: i64,
        media: MediaType,
        content_id: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_collection
            WHERE user_id = $1 AND media_type = $2 AND content_id = $3
            "#,
        )
        .bind(user_id)
        .bind(media.as_str())
        .bind(content_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ActivityStore for PgCatalogStore {
    async fn append(&self, activity: NewActivity) -> AppResult<ActivityRecord> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            INSERT INTO admin_activity_log (entity_type, entity_id, actor_id, action, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, entity_type, entity_id, actor_id, action, details, created_at
            "#,
        )
        .bind(activity.entity.as_str())
        .bind(activity.entity_id)
        .bind(activity.actor_id)
        .bind(activity.action.as_str())
        .bind(&activity.details)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(
        &self,
        entity: ActivityEntity,
        entity_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ActivityRecord>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, entity_type, entity_id, actor_id, action, details, created_at
            FROM admin_activity_log
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(entity.as_str())
        .bind(entity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ActivityRecord::try_from).collect()
    }
}

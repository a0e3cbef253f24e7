use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod activity;
pub mod catalog;
pub mod collection;
pub mod recommendation;

pub use activity::{ActivityAction, ActivityEntity, ActivityRecord, NewActivity, PageRequest};
pub use catalog::CatalogCandidate;
pub use collection::{CollectionEntry, CollectionStatus, TaggedEntry, UpsertCollectionEntry};
pub use recommendation::{
    MediaFilter, RecommendationItem, RecommendationQuery, RecommendationResponse, TagWeight,
};

/// Kind of catalog content a user can collect
///
/// Content ids are only unique within one media type, so every reference to a
/// catalog item carries both.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Anime,
    Manga,
}

/// Table names backing one media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaTables {
    /// Catalog table holding the content rows
    pub content: &'static str,
    /// Link table between content and genres
    pub genre_link: &'static str,
    /// Link table between content and business entities (studios, publishers)
    pub business_link: &'static str,
    /// Foreign key column naming the content row in both link tables
    pub content_fk: &'static str,
}

impl MediaType {
    pub const ALL: [MediaType; 2] = [MediaType::Anime, MediaType::Manga];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Anime => "anime",
            MediaType::Manga => "manga",
        }
    }

    /// Tables a query for this media type must touch
    pub fn tables(&self) -> MediaTables {
        match self {
            MediaType::Anime => MediaTables {
                content: "anime",
                genre_link: "anime_genres",
                business_link: "anime_business",
                content_fk: "anime_id",
            },
            MediaType::Manga => MediaTables {
                content: "manga",
                genre_link: "manga_genres",
                business_link: "manga_business",
                content_fk: "manga_id",
            },
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anime" => Ok(MediaType::Anime),
            "manga" => Ok(MediaType::Manga),
            other => Err(AppError::InvalidInput(format!(
                "Unknown media type '{}', expected 'anime' or 'manga'",
                other
            ))),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::MediaType;
use crate::error::AppError;

/// Progress of a user on a collected item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Completed,
    InProgress,
    Planned,
    OnHold,
    Dropped,
}

impl CollectionStatus {
    pub const ALL: [CollectionStatus; 5] = [
        CollectionStatus::Completed,
        CollectionStatus::InProgress,
        CollectionStatus::Planned,
        CollectionStatus::OnHold,
        CollectionStatus::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Completed => "completed",
            CollectionStatus::InProgress => "in_progress",
            CollectionStatus::Planned => "planned",
            CollectionStatus::OnHold => "on_hold",
            CollectionStatus::Dropped => "dropped",
        }
    }

    /// Whether entries with this status feed the user's taste profile
    pub fn counts_toward_taste(&self) -> bool {
        matches!(
            self,
            CollectionStatus::Completed | CollectionStatus::InProgress
        )
    }
}

impl Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollectionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(CollectionStatus::Completed),
            "in_progress" => Ok(CollectionStatus::InProgress),
            "planned" => Ok(CollectionStatus::Planned),
            "on_hold" => Ok(CollectionStatus::OnHold),
            "dropped" => Ok(CollectionStatus::Dropped),
            other => Err(AppError::Internal(format!(
                "Unknown collection status '{}'",
                other
            ))),
        }
    }
}

/// A user's record of having watched or read a catalog item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionEntry {
    pub user_id: i64,
    pub media_type: MediaType,
    pub content_id: i64,
    pub status: CollectionStatus,
    /// 0-5, absent when the user never rated the item
    pub rating: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Collection entry joined with the descriptive tags of its content
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEntry {
    pub media_type: MediaType,
    pub content_id: i64,
    pub rating: Option<f64>,
    /// Genre, studio and publisher names, not deduplicated across sources
    pub tags: Vec<String>,
}

/// Request body for adding or updating a collection entry
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCollectionEntry {
    pub status: CollectionStatus,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl UpsertCollectionEntry {
    /// Rejects ratings outside 0-5
    pub fn validate(&self) -> Result<(), AppError> {
        match self.rating {
            Some(rating) if !rating.is_finite() || !(0.0..=5.0).contains(&rating) => {
                Err(AppError::InvalidInput(format!(
                    "Rating must be between 0 and 5, got {}",
                    rating
                )))
            }
            _ => Ok(()),
        }
    }
}

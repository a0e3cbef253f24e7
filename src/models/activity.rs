use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Kind of record an admin activity entry refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEntity {
    Anime,
    Manga,
    Business,
    UserCollection,
}

impl ActivityEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityEntity::Anime => "anime",
            ActivityEntity::Manga => "manga",
            ActivityEntity::Business => "business",
            ActivityEntity::UserCollection => "user_collection",
        }
    }
}

impl Display for ActivityEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityEntity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(ActivityEntity::Anime),
            "manga" => Ok(ActivityEntity::Manga),
            "business" => Ok(ActivityEntity::Business),
            "user_collection" => Ok(ActivityEntity::UserCollection),
            other => Err(AppError::InvalidInput(format!(
                "Unknown activity entity '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
            ActivityAction::Deleted => "deleted",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ActivityAction::Created),
            "updated" => Ok(ActivityAction::Updated),
            "deleted" => Ok(ActivityAction::Deleted),
            other => Err(AppError::Internal(format!(
                "Unknown activity action '{}'",
                other
            ))),
        }
    }
}

/// Activity entry about to be appended to the log
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub entity: ActivityEntity,
    pub entity_id: i64,
    /// Admin or user that triggered the change, when known
    pub actor_id: Option<i64>,
    pub action: ActivityAction,
    pub details: serde_json::Value,
}

/// Stored activity entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub id: i64,
    pub entity: ActivityEntity,
    pub entity_id: i64,
    pub actor_id: Option<i64>,
    pub action: ActivityAction,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// limit/offset pagination parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageRequest {
    /// Returns the validated `(limit, offset)` pair
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::InvalidInput(
                "offset cannot be negative".to_string(),
            ));
        }

        Ok((limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_from_str() {
        assert_eq!(
            "user_collection".parse::<ActivityEntity>().unwrap(),
            ActivityEntity::UserCollection
        );
        assert!("studio".parse::<ActivityEntity>().is_err());
    }

    #[test]
    fn test_page_defaults() {
        assert_eq!(PageRequest::default().resolve().unwrap(), (20, 0));
    }

    #[test]
    fn test_page_rejects_out_of_range() {
        let page = PageRequest {
            limit: Some(101),
            offset: None,
        };
        assert!(page.resolve().is_err());

        let page = PageRequest {
            limit: Some(10),
            offset: Some(-3),
        };
        assert!(page.resolve().is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::MediaType;
use crate::error::AppError;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 20;
pub const MAX_RECOMMENDATION_LIMIT: usize = 50;

/// Media types a recommendation request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    Anime,
    Manga,
    #[default]
    All,
}

impl MediaFilter {
    pub fn media_types(&self) -> &'static [MediaType] {
        match self {
            MediaFilter::Anime => &[MediaType::Anime],
            MediaFilter::Manga => &[MediaType::Manga],
            MediaFilter::All => &MediaType::ALL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFilter::Anime => "anime",
            MediaFilter::Manga => "manga",
            MediaFilter::All => "all",
        }
    }
}

impl Display for MediaFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(MediaFilter::All),
            other => other.parse::<MediaType>().map(|media| match media {
                MediaType::Anime => MediaFilter::Anime,
                MediaType::Manga => MediaFilter::Manga,
            }),
        }
    }
}

/// Raw query string of a recommendation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub limit: Option<usize>,
}

impl RecommendationQuery {
    /// Parses the filter and checks the limit bounds
    pub fn validate(&self) -> Result<(MediaFilter, usize), AppError> {
        let filter = match &self.media_type {
            Some(raw) => raw.parse()?,
            None => MediaFilter::All,
        };

        let limit = self.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
        if limit == 0 || limit > MAX_RECOMMENDATION_LIMIT {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_RECOMMENDATION_LIMIT
            )));
        }

        Ok((filter, limit))
    }
}

/// Accumulated affinity of a user for one tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagWeight {
    pub tag: String,
    pub weight: f64,
}

/// A single scored recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub content_id: i64,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    pub image: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
    pub matching_tags: Vec<String>,
    pub score: f64,
}

/// Recommendation list returned to the client and stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendationItem>,
    pub user_top_tags: Vec<TagWeight>,
    /// Number of collection entries the taste profile was built from
    pub total_analyzed: usize,
}

impl RecommendationResponse {
    pub fn empty(total_analyzed: usize) -> Self {
        Self {
            recommendations: Vec::new(),
            user_top_tags: Vec::new(),
            total_analyzed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_all() {
        let (filter, limit) = RecommendationQuery::default().validate().unwrap();
        assert_eq!(filter, MediaFilter::All);
        assert_eq!(limit, DEFAULT_RECOMMENDATION_LIMIT);
    }

    #[test]
    fn test_filter_parses_media_type() {
        let query = RecommendationQuery {
            media_type: Some("MANGA".to_string()),
            limit: Some(5),
        };
        assert_eq!(query.validate().unwrap(), (MediaFilter::Manga, 5));
    }

    #[test]
    fn test_filter_rejects_unknown_type() {
        let query = RecommendationQuery {
            media_type: Some("game".to_string()),
            limit: None,
        };
        assert!(matches!(query.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_limit_bounds() {
        for limit in [0, MAX_RECOMMENDATION_LIMIT + 1] {
            let query = RecommendationQuery {
                media_type: None,
                limit: Some(limit),
            };
            assert!(query.validate().is_err());
        }
    }

    #[test]
    fn test_all_filter_covers_both_media_types() {
        assert_eq!(MediaFilter::All.media_types(), &MediaType::ALL);
        assert_eq!(MediaFilter::Anime.media_types(), &[MediaType::Anime]);
    }

    #[test]
    fn test_response_uses_camel_case() {
        let response = RecommendationResponse {
            recommendations: vec![RecommendationItem {
                content_id: 99,
                media_type: MediaType::Anime,
                title: "Frieren".to_string(),
                image: None,
                average_rating: 4.8,
                review_count: 120,
                matching_tags: vec!["fantasy".to_string()],
                score: 42.0,
            }],
            user_top_tags: vec![TagWeight {
                tag: "fantasy".to_string(),
                weight: 3.0,
            }],
            total_analyzed: 1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["totalAnalyzed"], 1);
        assert_eq!(json["userTopTags"][0]["tag"], "fantasy");
        assert_eq!(json["recommendations"][0]["contentId"], 99);
        assert_eq!(json["recommendations"][0]["type"], "anime");
        assert_eq!(json["recommendations"][0]["matchingTags"][0], "fantasy");
    }
}

use serde::{Deserialize, Serialize};

use super::MediaType;

/// Catalog item considered for recommendation, with its normalized tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogCandidate {
    pub media_type: MediaType,
    pub content_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
    pub tags: Vec<String>,
}

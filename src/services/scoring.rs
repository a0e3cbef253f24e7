//! Candidate scoring for recommendations.

use std::collections::{HashMap, HashSet};

use super::tag_weights::normalize_tag;
use crate::models::{CatalogCandidate, MediaType, RecommendationItem};

const TAG_SCORE_FACTOR: f64 = 10.0;
const RATING_FACTOR: f64 = 2.0;
const POPULARITY_FACTOR: f64 = 0.5;

/// Final score of a candidate
///
/// Tag affinity dominates; average rating and the log of the review count
/// separate candidates with similar affinity.
pub fn candidate_score(tag_score: f64, average_rating: f64, review_count: i64) -> f64 {
    let popularity = (review_count.max(0) as f64 + 1.0).ln();
    tag_score * TAG_SCORE_FACTOR + average_rating * RATING_FACTOR + popularity * POPULARITY_FACTOR
}

/// Scores, filters and ranks candidates against a tag-weight map
///
/// Candidates in `exclude`, repeated candidates and candidates sharing no tag
/// with `weights` are dropped. The result is sorted by score descending, then
/// media type and content id ascending, and truncated to `limit`.
pub fn score_candidates(
    candidates: Vec<CatalogCandidate>,
    weights: &HashMap<String, f64>,
    exclude: &HashSet<(MediaType, i64)>,
    limit: usize,
) -> Vec<RecommendationItem> {
    let mut seen: HashSet<(MediaType, i64)> = HashSet::new();
    let mut scored: Vec<RecommendationItem> = Vec::new();

    for candidate in candidates {
        let identity = (candidate.media_type, candidate.content_id);
        if exclude.contains(&identity) || !seen.insert(identity) {
            continue;
        }

        let mut tag_score = 0.0;
        let mut matching_tags: Vec<String> = Vec::new();

        for tag in candidate.tags.iter().filter_map(|t| normalize_tag(t)) {
            if let Some(weight) = weights.get(&tag) {
                tag_score += weight;
                if !matching_tags.contains(&tag) {
                    matching_tags.push(tag);
                }
            }
        }

        if matching_tags.is_empty() {
            continue;
        }

        scored.push(RecommendationItem {
            content_id: candidate.content_id,
            media_type: candidate.media_type,
            score: candidate_score(
                tag_score,
                candidate.average_rating,
                candidate.review_count,
            ),
            title: candidate.title,
            image: candidate.image,
            average_rating: candidate.average_rating,
            review_count: candidate.review_count,
            matching_tags,
        });
    }

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.media_type.cmp(&b.media_type))
            .then_with(|| a.content_id.cmp(&b.content_id))
    });
    scored.truncate(limit);
    scored
}

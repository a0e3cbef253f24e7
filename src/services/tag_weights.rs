//! Turns a user's rated collection into a tag-affinity map.

use std::collections::HashMap;

use crate::models::{TagWeight, TaggedEntry};

/// Normalizes a genre/studio/publisher name for matching
///
/// Returns `None` for names that are empty once trimmed.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_lowercase())
    }
}

/// Weight an entry adds to each of its tags, by rating breakpoint
pub fn rating_multiplier(rating: Option<f64>) -> f64 {
    match rating {
        None => 1.0,
        Some(r) if !r.is_finite() => 1.0,
        Some(r) if r >= 4.5 => 3.0,
        Some(r) if r >= 4.0 => 2.5,
        Some(r) if r >= 3.5 => 2.0,
        Some(r) if r >= 3.0 => 1.5,
        Some(_) => 0.5,
    }
}

/// Accumulates the rating multiplier of every entry onto each of its tags
///
/// Tags repeated on one entry (e.g. a name that is both a genre and a studio)
/// count once per occurrence.
pub fn extract_tag_weights(entries: &[TaggedEntry]) -> HashMap<String, f64> {
    let mut weights: HashMap<String, f64> = HashMap::new();

    for entry in entries {
        let multiplier = rating_multiplier(entry.rating);
        for tag in entry.tags.iter().filter_map(|t| normalize_tag(t)) {
            *weights.entry(tag).or_insert(0.0) += multiplier;
        }
    }

    weights
}

/// The `n` heaviest tags, heaviest first, ties broken alphabetically
pub fn top_tags(weights: &HashMap<String, f64>, n: usize) -> Vec<TagWeight> {
    let mut ranked: Vec<TagWeight> = weights
        .iter()
        .map(|(tag, weight)| TagWeight {
            tag: tag.clone(),
            weight: *weight,
        })
        .collect();

    ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.tag.cmp(&b.tag)));
    ranked.truncate(n);
    ranked
}

//! Metadata boost and merge of vector search results.

use crate::entities::MedicalEntities;
use crate::vector_store::ScoredMatch;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Render a metadata value the way it is compared: strings as-is, null as
/// empty, everything else as compact JSON.
pub fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decides whether a match's metadata agrees with the extracted entities.
#[derive(Debug, Clone, Default)]
pub struct MetadataMatcher {
    topics: HashSet<String>,
    diagnoses: HashSet<String>,
    complaints: HashSet<String>,
}

impl MetadataMatcher {
    pub fn new(entities: &MedicalEntities) -> Self {
        Self {
            topics: entities.topic_set(),
            diagnoses: entities.diagnosis_set(),
            complaints: entities.complaint_set(),
        }
    }

    /// True if any extracted topic equals a tag or the topics field, the
    /// chief complaint equals an extracted complaint, or the final diagnosis
    /// equals an extracted diagnosis. Comparison is case-insensitive.
    pub fn is_match(&self, hit: &ScoredMatch, final_dx: Option<&str>) -> bool {
        let meta = &hit.metadata;

        if meta
            .tags
            .iter()
            .any(|tag| self.topics.contains(&tag.to_lowercase()))
        {
            return true;
        }
        if self
            .topics
            .contains(&value_to_text(&meta.topics).to_lowercase())
        {
            return true;
        }
        if self
            .complaints
            .contains(&meta.chief_complaint.to_lowercase())
        {
            return true;
        }
        self.diagnoses
            .contains(&final_dx.unwrap_or_default().to_lowercase())
    }
}

/// Boost metadata-matched hits, merge them with the rest, sort and truncate.
///
/// Matched hits gain `boost` and are placed first; every other hit follows
/// unless its ID was already taken. The merged list is sorted by score,
/// highest first, keeping the merge order among equal scores.
pub fn rerank<F>(matches: Vec<ScoredMatch>, is_match: F, boost: f32, limit: usize) -> Vec<ScoredMatch>
where
    F: Fn(&ScoredMatch) -> bool,
{
    let (boosted, rest): (Vec<ScoredMatch>, Vec<ScoredMatch>) =
        matches.into_iter().partition(|m| is_match(m));

    let mut seen = HashSet::new();
    let mut combined = Vec::with_capacity(boosted.len() + rest.len());

    for mut hit in boosted {
        if seen.insert(hit.id.clone()) {
            hit.score += boost;
            combined.push(hit);
        }
    }
    for hit in rest {
        if seen.insert(hit.id.clone()) {
            combined.push(hit);
        }
    }

    combined.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    combined.truncate(limit);
    combined
}

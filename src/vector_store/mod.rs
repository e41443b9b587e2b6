//! Vector index abstraction for medrag.
//!
//! The managed index is a black box reached over HTTP; an in-memory index with
//! the same contract backs tests and offline runs.

mod memory;
mod pinecone;

pub use memory::MemoryIndex;
pub use pinecone::{PineconeIndex, API_KEY_ENV as PINECONE_API_KEY_ENV};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Metadata stored alongside every chunk vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub chief_complaint: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form topics as submitted (usually a string).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub topics: serde_json::Value,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default, deserialize_with = "index_from_number")]
    pub chunk_index: usize,
}

/// The index hands numbers back as floats, so accept `3.0` for an index.
fn index_from_number<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value < 0.0 || !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "invalid chunk index: {}",
            value
        )));
    }
    Ok(value as usize)
}

/// A vector ready to be written to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A query hit with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    /// Similarity score (higher is better).
    pub score: f32,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace vectors, returning how many were written.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Return the `top_k` most similar vectors with their metadata.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
    }

    #[test]
    fn test_metadata_from_index_response() {
        let meta: ChunkMetadata = serde_json::from_str(
            r#"{
                "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "chief_complaint": "Chest pain",
                "tags": ["cardiology"],
                "text": "ST elevation in leads II, III and aVF",
                "start_time": 12.5,
                "duration": 9.0,
                "chunk_index": 3.0
            }"#,
        )
        .unwrap();

        assert_eq!(meta.chunk_index, 3);
        assert!(meta.topics.is_null());
        assert_eq!(meta.tags, vec!["cardiology".to_string()]);
    }

    #[test]
    fn test_null_topics_are_not_sent() {
        let meta = ChunkMetadata::default();
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("topics").is_none());
    }

    #[test]
    fn test_negative_chunk_index_rejected() {
        let result: std::result::Result<ChunkMetadata, _> =
            serde_json::from_str(r#"{"chunk_index": -1}"#);
        assert!(result.is_err());
    }
}

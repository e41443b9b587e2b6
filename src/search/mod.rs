//! Search pipeline: entity extraction, vector query, metadata rerank.

mod rerank;

pub use rerank::{rerank, value_to_text, MetadataMatcher};

use crate::catalog::SharedCatalog;
use crate::config::SearchSettings;
use crate::embedding::Embedder;
use crate::entities::{EntityExtractor, MedicalEntities};
use crate::error::Result;
use crate::vector_store::VectorIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub url: String,
    pub score: f32,
    pub start_time: f64,
    /// The video's catalog record, or an empty object.
    pub metadata: serde_json::Value,
    pub final_dx: Option<String>,
}

/// Search results plus the entities that drove the rerank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub matches: Vec<SearchHit>,
    pub gemini_entities: MedicalEntities,
}

/// Knobs for one search service.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Candidates fetched from the index.
    pub top_k: usize,
    /// Score added to metadata matches.
    pub boost: f32,
    /// Results returned.
    pub max_results: usize,
}

impl SearchOptions {
    pub fn new(top_k: usize, settings: &SearchSettings) -> Self {
        Self {
            top_k,
            boost: settings.boost,
            max_results: settings.max_results,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new(50, &SearchSettings::default())
    }
}

/// Runs queries against the index and reranks with catalog metadata.
pub struct SearchService {
    extractor: Arc<dyn EntityExtractor>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    catalog: SharedCatalog,
    options: SearchOptions,
}

impl SearchService {
    pub fn new(
        extractor: Arc<dyn EntityExtractor>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        catalog: SharedCatalog,
        options: SearchOptions,
    ) -> Self {
        Self {
            extractor,
            embedder,
            index,
            catalog,
            options,
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        let entities = self.extractor.extract(query).await;
        let matcher = MetadataMatcher::new(&entities);

        let vector = self.embedder.embed(query).await?;
        let matches = self.index.query(&vector, self.options.top_k).await?;
        debug!("Index returned {} candidates", matches.len());

        let catalog = self.catalog.read().await;

        let ranked = rerank(
            matches,
            |m| matcher.is_match(m, catalog.final_dx(&m.metadata.url)),
            self.options.boost,
            self.options.max_results,
        );

        let hits: Vec<SearchHit> = ranked
            .into_iter()
            .map(|m| {
                let url = m.metadata.url;
                let metadata = catalog
                    .video(&url)
                    .and_then(|v| serde_json::to_value(v).ok())
                    .unwrap_or_else(|| serde_json::json!({}));
                let final_dx = catalog.final_dx(&url).map(str::to_string);

                SearchHit {
                    id: m.id,
                    text: m.metadata.text,
                    url,
                    score: m.score,
                    start_time: m.metadata.start_time,
                    metadata,
                    final_dx,
                }
            })
            .collect();

        info!("Returning {} results", hits.len());
        Ok(SearchResponse {
            matches: hits,
            gemini_entities: entities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, DiagnosisRecord, JsonMap, VideoRecord};
    use crate::error::MedragError;
    use crate::vector_store::{ChunkMetadata, MemoryIndex, VectorRecord};
    use async_trait::async_trait;

    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(MedragError::Embedding("model offline".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(MedragError::Embedding("model offline".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct FixedExtractor(MedicalEntities);

    #[async_trait]
    impl EntityExtractor for FixedExtractor {
        async fn extract(&self, _query: &str) -> MedicalEntities {
            self.0.clone()
        }
    }

    fn record(id: &str, url: &str, values: Vec<f32>, complaint: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: ChunkMetadata {
                url: url.to_string(),
                chief_complaint: complaint.to_string(),
                text: format!("text {}", id),
                start_time: 30.0,
                ..Default::default()
            },
        }
    }

    fn catalog() -> SharedCatalog {
        let mut videos = JsonMap::empty("video-data.json");
        videos.insert(
            "u2",
            VideoRecord {
                url: "u2".to_string(),
                chief_complaint: "Syncope".to_string(),
                ..Default::default()
            },
        );
        let mut diagnoses = JsonMap::empty("dx.json");
        diagnoses.insert(
            "u2",
            DiagnosisRecord {
                final_dx: Some("Aortic stenosis".to_string()),
                ..Default::default()
            },
        );
        Catalog {
            videos,
            chunks: JsonMap::empty("chunk-details.json"),
            diagnoses,
        }
        .shared()
    }

    async fn index() -> Arc<MemoryIndex> {
        let index = Arc::new(MemoryIndex::new());
        index
            .upsert(&[
                record("close", "u1", vec![1.0, 0.1], "Headache"),
                record("far", "u2", vec![0.2, 1.0], "Syncope"),
            ])
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_similarity_order_without_entities() {
        let service = SearchService::new(
            Arc::new(FixedExtractor(MedicalEntities::default())),
            Arc::new(AxisEmbedder),
            index().await,
            catalog(),
            SearchOptions::default(),
        );

        let response = service.search("headache").await.unwrap();
        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].id, "close");
        assert_eq!(response.matches[0].metadata, serde_json::json!({}));
        assert_eq!(response.matches[0].final_dx, None);
        assert!(response.gemini_entities.is_empty());
    }

    #[tokio::test]
    async fn test_diagnosis_match_boosts_result() {
        let entities = MedicalEntities {
            diagnoses: vec!["aortic stenosis".to_string()],
            ..Default::default()
        };
        let service = SearchService::new(
            Arc::new(FixedExtractor(entities.clone())),
            Arc::new(AxisEmbedder),
            index().await,
            catalog(),
            SearchOptions::default(),
        );

        let response = service.search("old man fainting").await.unwrap();
        let top = &response.matches[0];
        assert_eq!(top.id, "far");
        assert!(top.score > 1.0);
        assert_eq!(top.final_dx.as_deref(), Some("Aortic stenosis"));
        assert_eq!(top.metadata["chief_complaint"], "Syncope");
        assert_eq!(top.start_time, 30.0);
        assert_eq!(response.gemini_entities, entities);
    }

    #[tokio::test]
    async fn test_result_limit() {
        let options = SearchOptions {
            top_k: 50,
            boost: 1.0,
            max_results: 1,
        };
        let service = SearchService::new(
            Arc::new(FixedExtractor(MedicalEntities::default())),
            Arc::new(AxisEmbedder),
            index().await,
            catalog(),
            options,
        );

        assert_eq!(service.search("q").await.unwrap().matches.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let service = SearchService::new(
            Arc::new(FixedExtractor(MedicalEntities::default())),
            Arc::new(FailingEmbedder),
            index().await,
            catalog(),
            SearchOptions::default(),
        );

        let err = service.search("q").await.unwrap_err();
        assert!(matches!(err, MedragError::Embedding(_)));
    }
}

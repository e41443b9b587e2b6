//! Ingestion pipeline for the add route.
//!
//! Fetches a video's transcript, chunks and embeds it, upserts the vectors and
//! records the chunk details and video metadata in the catalogs.

use crate::catalog::{ChunkDetail, SharedCatalog, VideoRecord};
use crate::chunking::{TranscriptChunk, WordChunker};
use crate::embedding::Embedder;
use crate::error::{MedragError, Result};
use crate::vector_store::{ChunkMetadata, VectorIndex, VectorRecord};
use crate::youtube::{extract_video_id, TranscriptProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Body of an add request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub topics: serde_json::Value,
}

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub message: String,
    /// MD5 hex digest of the video URL; prefix of every chunk ID.
    pub id: String,
    pub chunks: usize,
}

/// Key under which a video's chunks are stored.
pub fn video_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Vector ID of a chunk.
pub fn chunk_id(video_key: &str, position: usize) -> String {
    format!("{}-chunk-{}", video_key, position)
}

/// Coordinates transcript fetch, chunking, embedding, upsert and catalog writes.
pub struct Ingestor {
    transcripts: Arc<dyn TranscriptProvider>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    catalog: SharedCatalog,
    chunker: WordChunker,
}

impl Ingestor {
    pub fn new(
        transcripts: Arc<dyn TranscriptProvider>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        catalog: SharedCatalog,
        chunker: WordChunker,
    ) -> Self {
        Self {
            transcripts,
            embedder,
            index,
            catalog,
            chunker,
        }
    }

    /// Add a video to the index and catalogs.
    #[instrument(skip(self, request), fields(url = ?request.youtube_url))]
    pub async fn add(&self, request: AddRequest) -> Result<AddOutcome> {
        let (url, chief_complaint) = match (
            non_empty(request.youtube_url),
            non_empty(request.chief_complaint),
        ) {
            (Some(url), Some(complaint)) => (url, complaint),
            _ => return Err(MedragError::InvalidInput("Missing required fields".to_string())),
        };

        let key = video_key(&url);
        let video_id = extract_video_id(&url)
            .ok_or_else(|| MedragError::InvalidInput("Invalid YouTube URL".to_string()))?;

        info!("Fetching transcript...");
        let transcript = self
            .transcripts
            .fetch_transcript(&video_id)
            .await?
            .ok_or(MedragError::TranscriptUnavailable)?;

        info!("Chunking transcript...");
        let chunks = self.chunker.chunk(&transcript);

        info!("Generating embeddings for {} chunks...", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(MedragError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let base = ChunkMetadata {
            url: url.clone(),
            chief_complaint: chief_complaint.clone(),
            tags: request.tags.clone(),
            topics: request.topics.clone(),
            ..Default::default()
        };
        let vectors = build_vectors(&key, &base, &chunks, embeddings);

        info!("Uploading {} chunks to the index...", vectors.len());
        self.index.upsert(&vectors).await?;

        {
            let mut catalog = self.catalog.write().await;
            catalog.chunks.extend(chunks.iter().enumerate().map(|(i, chunk)| {
                (
                    chunk_id(&key, i),
                    ChunkDetail {
                        text: chunk.text.clone(),
                        start_time: chunk.start_time,
                        duration: chunk.duration,
                        chunk_index: chunk.chunk_index,
                        url: url.clone(),
                    },
                )
            }));
            catalog.chunks.save()?;

            let previous_extra = catalog
                .video(&url)
                .map(|v| v.extra.clone())
                .unwrap_or_default();
            catalog.videos.insert(
                url.clone(),
                VideoRecord {
                    url: url.clone(),
                    chief_complaint,
                    tags: request.tags,
                    topics: request.topics,
                    added_at: Some(chrono::Utc::now().timestamp()),
                    extra: previous_extra,
                },
            );
            catalog.videos.save()?;
        }

        info!("Upload complete.");
        Ok(AddOutcome {
            message: "Video and transcript chunks added successfully".to_string(),
            id: key,
            chunks: chunks.len(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn build_vectors(
    key: &str,
    base: &ChunkMetadata,
    chunks: &[TranscriptChunk],
    embeddings: Vec<Vec<f32>>,
) -> Vec<VectorRecord> {
    chunks
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (chunk, values))| VectorRecord {
            id: chunk_id(key, i),
            values,
            metadata: ChunkMetadata {
                text: chunk.text.clone(),
                start_time: chunk.start_time,
                duration: chunk.duration,
                chunk_index: chunk.chunk_index,
                ..base.clone()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::vector_store::MemoryIndex;
    use crate::youtube::CaptionEntry;
    use async_trait::async_trait;

    struct StaticTranscripts(Option<Vec<CaptionEntry>>);

    #[async_trait]
    impl TranscriptProvider for StaticTranscripts {
        async fn fetch_transcript(&self, _video_id: &str) -> Result<Option<Vec<CaptionEntry>>> {
            Ok(self.0.clone())
        }
    }

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn transcript() -> Vec<CaptionEntry> {
        vec![
            CaptionEntry::new("patient presents with", 0.0, 2.0),
            CaptionEntry::new("crushing chest pain", 2.0, 2.0),
            CaptionEntry::new("radiating to the jaw", 4.0, 3.0),
        ]
    }

    fn ingestor(
        dir: &tempfile::TempDir,
        transcript: Option<Vec<CaptionEntry>>,
        index: Arc<MemoryIndex>,
    ) -> (Ingestor, SharedCatalog) {
        let catalog = Catalog::load(
            &dir.path().join("video-data.json"),
            &dir.path().join("chunk-details.json"),
            &dir.path().join("dx.json"),
        )
        .unwrap()
        .shared();
        let ingestor = Ingestor::new(
            Arc::new(StaticTranscripts(transcript)),
            Arc::new(LengthEmbedder),
            index,
            catalog.clone(),
            WordChunker::new(5),
        );
        (ingestor, catalog)
    }

    fn request() -> AddRequest {
        AddRequest {
            youtube_url: Some(URL.to_string()),
            chief_complaint: Some("Chest pain".to_string()),
            tags: vec!["cardiology".to_string()],
            topics: serde_json::json!("ACS"),
        }
    }

    #[test]
    fn test_video_key_is_md5_of_url() {
        assert_eq!(video_key(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(chunk_id("abc", 2), "abc-chunk-2");
    }

    #[tokio::test]
    async fn test_add_indexes_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(MemoryIndex::new());
        let (ingestor, catalog) = ingestor(&dir, Some(transcript()), index.clone());

        let outcome = ingestor.add(request()).await.unwrap();
        let key = video_key(URL);

        assert_eq!(outcome.id, key);
        assert_eq!(outcome.chunks, 2);
        assert_eq!(outcome.message, "Video and transcript chunks added successfully");

        let first = index.get(&chunk_id(&key, 0)).await.unwrap();
        assert_eq!(first.metadata.text, "patient presents with crushing chest pain");
        assert_eq!(first.metadata.chief_complaint, "Chest pain");
        assert_eq!(first.metadata.tags, vec!["cardiology".to_string()]);
        assert_eq!(first.metadata.topics, serde_json::json!("ACS"));
        assert_eq!(first.metadata.duration, 4.0);

        let second = index.get(&chunk_id(&key, 1)).await.unwrap();
        assert_eq!(second.metadata.start_time, 4.0);
        assert_eq!(second.metadata.chunk_index, 1);

        let catalog = catalog.read().await;
        assert_eq!(catalog.chunks.len(), 2);
        let video = catalog.video(URL).unwrap();
        assert_eq!(video.chief_complaint, "Chest pain");
        assert!(video.added_at.is_some());

        let on_disk = std::fs::read_to_string(dir.path().join("video-data.json")).unwrap();
        assert!(on_disk.contains("\"chief_complaint\": \"Chest pain\""));
        assert!(dir.path().join("chunk-details.json").exists());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (ingestor, _) = ingestor(&dir, Some(transcript()), Arc::new(MemoryIndex::new()));

        let mut req = request();
        req.chief_complaint = Some("  ".to_string());
        let err = ingestor.add(req).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");

        let mut req = request();
        req.youtube_url = None;
        assert!(ingestor.add(req).await.unwrap_err().is_client_error());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (ingestor, _) = ingestor(&dir, Some(transcript()), Arc::new(MemoryIndex::new()));

        let mut req = request();
        req.youtube_url = Some("https://example.com/video".to_string());
        let err = ingestor.add(req).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid YouTube URL");
    }

    #[tokio::test]
    async fn test_missing_transcript_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(MemoryIndex::new());
        let (ingestor, catalog) = ingestor(&dir, None, index.clone());

        let err = ingestor.add(request()).await.unwrap_err();
        assert!(matches!(err, MedragError::TranscriptUnavailable));
        assert!(index.is_empty().await);
        assert!(catalog.read().await.videos.is_empty());
        assert!(!dir.path().join("video-data.json").exists());
    }

    #[test]
    fn test_add_request_field_names() {
        let req: AddRequest = serde_json::from_str(
            r#"{"youtubeUrl": "u", "chiefComplaint": "c", "topics": "Renal"}"#,
        )
        .unwrap();
        assert_eq!(req.youtube_url.as_deref(), Some("u"));
        assert_eq!(req.chief_complaint.as_deref(), Some("c"));
        assert!(req.tags.is_empty());
        assert_eq!(req.topics, serde_json::json!("Renal"));
    }
}

//! Sentence-transformers embeddings served by a Hugging Face feature-extraction endpoint.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{MedragError, Result};
use crate::http::{build_client, env_secret};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Environment variable holding the Hugging Face access token.
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

/// Embedder backed by `POST {endpoint}/pipeline/feature-extraction/{model}`.
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    dimensions: usize,
    batch_size: usize,
}

impl HuggingFaceEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let client = build_client(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self {
            client,
            url: format!(
                "{}/pipeline/feature-extraction/{}",
                settings.endpoint.trim_end_matches('/'),
                settings.model
            ),
            token: env_secret(TOKEN_ENV),
            dimensions: settings.dimensions as usize,
            batch_size: settings.batch_size.max(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&FeatureExtractionRequest { inputs });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MedragError::Embedding(format!(
                "feature-extraction returned {}: {}",
                status, body
            )));
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        if vectors.len() != inputs.len() {
            return Err(MedragError::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MedragError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!("Embedding batch {} ({} texts)", i + 1, batch.len());
            all_embeddings.extend(self.request(batch).await?);
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_from_settings() {
        let settings = EmbeddingSettings {
            endpoint: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let embedder = HuggingFaceEmbedder::from_settings(&settings).unwrap();
        assert_eq!(
            embedder.url(),
            "http://localhost:8080/pipeline/feature-extraction/pritamdeka/BioBERT-mnli-snli-scinli-scitail-mednli-stsb"
        );
        assert_eq!(embedder.dimensions(), 768);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let settings = EmbeddingSettings {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let embedder = HuggingFaceEmbedder::from_settings(&settings).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }
}

//! Pinecone REST client for the managed vector index.

use super::{ScoredMatch, VectorIndex, VectorRecord};
use crate::config::VectorIndexSettings;
use crate::error::{MedragError, Result};
use crate::http::{build_client, env_secret, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Environment variable holding the Pinecone API key.
pub const API_KEY_ENV: &str = "PINECONE_API_KEY";

const API_VERSION: &str = "2024-07";

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredMatch>,
}

/// Client for one Pinecone index.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    name: String,
    control_url: String,
    host: OnceCell<String>,
    batch_size: usize,
}

impl PineconeIndex {
    /// Create a client using the API key from the environment.
    pub fn from_settings(settings: &VectorIndexSettings) -> Result<Self> {
        let api_key = env_secret(API_KEY_ENV)
            .ok_or_else(|| MedragError::Config(format!("{} is not set", API_KEY_ENV)))?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &VectorIndexSettings, api_key: String) -> Result<Self> {
        let host = OnceCell::new();
        if let Some(configured) = settings.host.as_deref().filter(|h| !h.is_empty()) {
            // Freshly created cell; set cannot fail.
            let _ = host.set(normalize_host(configured));
        }

        Ok(Self {
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
            api_key,
            name: settings.name.clone(),
            control_url: settings.control_url.trim_end_matches('/').to_string(),
            host,
            batch_size: settings.upsert_batch_size.max(1),
        })
    }

    /// Data plane base URL, resolved through the control plane on first use.
    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!("{}/indexes/{}", self.control_url, self.name);
                debug!("Resolving index host via {}", url);

                let response = self
                    .client
                    .get(&url)
                    .header("Api-Key", &self.api_key)
                    .header("X-Pinecone-API-Version", API_VERSION)
                    .send()
                    .await?;
                let response = check_status(response, "describe index").await?;
                let described: DescribeIndexResponse = response.json().await?;

                info!("Using index '{}' at {}", self.name, described.host);
                Ok::<_, MedragError>(normalize_host(&described.host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.host().await?, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await?;
        check_status(response, path).await
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut written = 0;

        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            let response = self
                .post("/vectors/upsert", &UpsertRequest { vectors: batch })
                .await?;
            let body: UpsertResponse = response.json().await?;
            written += body.upserted_count.unwrap_or(batch.len());
            info!("Uploaded batch {}", i + 1);
        }

        Ok(written)
    }

    #[instrument(skip(self, vector))]
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let response = self
            .post(
                "/query",
                &QueryRequest {
                    vector,
                    top_k,
                    include_metadata: true,
                    include_values: false,
                },
            )
            .await?;
        let body: QueryResponse = response.json().await?;
        debug!("Index returned {} matches", body.matches.len());
        Ok(body.matches)
    }
}

/// Prefix bare hosts with https.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MedragError::VectorIndex(format!(
        "{} failed with {}: {}",
        what, status, body
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::ChunkMetadata;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("medrag-abc123.svc.us-east-1.pinecone.io"),
            "https://medrag-abc123.svc.us-east-1.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.5f32, 0.25];
        let body = serde_json::to_value(QueryRequest {
            vector: &vector,
            top_k: 50,
            include_metadata: true,
            include_values: false,
        })
        .unwrap();

        assert_eq!(body["topK"], 50);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["vector"][1], 0.25);
    }

    #[test]
    fn test_upsert_request_shape() {
        let records = vec![VectorRecord {
            id: "abc-chunk-0".to_string(),
            values: vec![0.5],
            metadata: ChunkMetadata {
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                topics: serde_json::json!("Cardiology"),
                ..Default::default()
            },
        }];
        let body = serde_json::to_value(UpsertRequest { vectors: &records }).unwrap();

        assert_eq!(body["vectors"][0]["id"], "abc-chunk-0");
        assert_eq!(body["vectors"][0]["metadata"]["topics"], "Cardiology");
    }

    #[test]
    fn test_query_response_parse() {
        let body: QueryResponse = serde_json::from_str(
            r#"{"matches": [{"id": "x-chunk-1", "score": 0.82, "values": [],
                "metadata": {"url": "u", "text": "t", "chunk_index": 1.0}}],
                "namespace": ""}"#,
        )
        .unwrap();
        assert_eq!(body.matches.len(), 1);
        assert_eq!(body.matches[0].metadata.chunk_index, 1);
    }

    #[tokio::test]
    async fn test_configured_host_skips_control_plane() {
        let settings = VectorIndexSettings {
            host: Some("medrag.example.pinecone.io".to_string()),
            control_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let index = PineconeIndex::with_api_key(&settings, "key".to_string()).unwrap();
        assert_eq!(index.host().await.unwrap(), "https://medrag.example.pinecone.io");
    }
}

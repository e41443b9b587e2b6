//! Medical entity extraction from free-text queries.
//!
//! An LLM pulls topics, diagnoses and complaints out of the query so search
//! results whose metadata agrees with them can be boosted. Extraction is best
//! effort: every failure degrades to empty lists.

use crate::config::{EntitySettings, Prompts};
use crate::error::{MedragError, Result};
use crate::http::{build_client, env_secret};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Entities extracted from a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalEntities {
    #[serde(default, deserialize_with = "list_or_null")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "list_or_null")]
    pub diagnoses: Vec<String>,
    #[serde(default, deserialize_with = "list_or_null")]
    pub complaints: Vec<String>,
}

/// A `null` list reads as empty.
fn list_or_null<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MedicalEntities {
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && self.diagnoses.is_empty() && self.complaints.is_empty()
    }

    /// Lowercased topics.
    pub fn topic_set(&self) -> HashSet<String> {
        lowercase_set(&self.topics)
    }

    /// Lowercased diagnoses.
    pub fn diagnosis_set(&self) -> HashSet<String> {
        lowercase_set(&self.diagnoses)
    }

    /// Lowercased complaints.
    pub fn complaint_set(&self) -> HashSet<String> {
        lowercase_set(&self.complaints)
    }
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

/// Trait for entity extractors.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract entities; failures yield empty entities.
    async fn extract(&self, query: &str) -> MedicalEntities;
}

/// Extractor that never finds anything.
pub struct NoopExtractor;

#[async_trait]
impl EntityExtractor for NoopExtractor {
    async fn extract(&self, _query: &str) -> MedicalEntities {
        MedicalEntities::default()
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Gemini `generateContent` backed extractor.
pub struct GeminiExtractor {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    prompts: Prompts,
}

impl GeminiExtractor {
    /// Create an extractor using the API key from the environment.
    pub fn from_settings(settings: &EntitySettings, prompts: Prompts) -> Result<Self> {
        Self::with_api_key(settings, prompts, env_secret(API_KEY_ENV))
    }

    pub fn with_api_key(
        settings: &EntitySettings,
        prompts: Prompts,
        api_key: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(settings.timeout_secs))?,
            url: format!(
                "{}/models/{}:generateContent",
                settings.endpoint.trim_end_matches('/'),
                settings.model
            ),
            api_key,
            prompts,
        })
    }

    async fn generate(&self, api_key: &str, prompt: String) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .header("X-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| MedragError::EntityExtraction("response has no candidates".to_string()))
    }
}

#[async_trait]
impl EntityExtractor for GeminiExtractor {
    #[instrument(skip(self))]
    async fn extract(&self, query: &str) -> MedicalEntities {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("{} not set, skipping entity extraction", API_KEY_ENV);
            return MedicalEntities::default();
        };

        let prompt = self.prompts.entity_prompt(query);
        let result = match self.generate(api_key, prompt).await {
            Ok(text) => parse_entities(&text),
            Err(e) => Err(e),
        };

        match result {
            Ok(entities) => {
                info!(
                    topics = ?entities.topics,
                    diagnoses = ?entities.diagnoses,
                    complaints = ?entities.complaints,
                    "Extracted entities"
                );
                entities
            }
            Err(e) => {
                warn!("Entity extraction error: {}", e);
                MedicalEntities::default()
            }
        }
    }
}

fn fenced_json_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("fenced json regex is valid")
    })
}

fn object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)(\{.*\})").expect("object regex is valid"))
}

/// Locate the JSON object in an LLM reply.
///
/// A fenced ```json block wins; otherwise the span from the first `{` to the
/// last `}`; otherwise the whole text.
pub fn extract_json_block(text: &str) -> &str {
    if let Some(m) = fenced_json_regex().captures(text).and_then(|c| c.get(1)) {
        return m.as_str();
    }
    if let Some(m) = object_regex().captures(text).and_then(|c| c.get(1)) {
        return m.as_str();
    }
    text
}

/// Parse an LLM reply into entities. Missing keys default to empty lists.
pub fn parse_entities(text: &str) -> Result<MedicalEntities> {
    serde_json::from_str(extract_json_block(text))
        .map_err(|e| MedragError::EntityExtraction(format!("unparseable reply: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"topics\": [\"Cardiology\"], \"diagnoses\": [\"STEMI\"], \"complaints\": [\"chest pain\"]}\n```\nHope that helps {ok}";
        let entities = parse_entities(reply).unwrap();
        assert_eq!(entities.topics, vec!["Cardiology"]);
        assert_eq!(entities.diagnoses, vec!["STEMI"]);
        assert_eq!(entities.complaints, vec!["chest pain"]);
    }

    #[test]
    fn test_parse_bare_object_with_missing_keys() {
        let reply = "Result: {\"topics\": [\"Neurology\"]} done";
        let entities = parse_entities(reply).unwrap();
        assert_eq!(entities.topics, vec!["Neurology"]);
        assert!(entities.diagnoses.is_empty());
        assert!(entities.complaints.is_empty());
    }

    #[test]
    fn test_parse_plain_json() {
        let entities = parse_entities(r#"{"complaints": ["dyspnea"]}"#).unwrap();
        assert_eq!(entities.complaints, vec!["dyspnea"]);
    }

    #[test]
    fn test_null_list_reads_as_empty() {
        let entities =
            parse_entities(r#"{"topics": [], "diagnoses": ["STEMI"], "complaints": null}"#).unwrap();
        assert_eq!(entities.diagnoses, vec!["STEMI"]);
        assert!(entities.complaints.is_empty());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_entities("I cannot help with that.").is_err());
    }

    #[test]
    fn test_lowercase_sets() {
        let entities = MedicalEntities {
            topics: vec!["Cardiology".into(), "cardiology".into()],
            diagnoses: vec!["STEMI".into()],
            complaints: vec![],
        };
        assert_eq!(entities.topic_set().len(), 1);
        assert!(entities.diagnosis_set().contains("stemi"));
        assert!(entities.complaint_set().is_empty());
        assert!(!entities.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_yields_empty() {
        let extractor =
            GeminiExtractor::with_api_key(&EntitySettings::default(), Prompts::default(), None)
                .unwrap();
        assert!(extractor.extract("chest pain").await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty() {
        let settings = EntitySettings {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let extractor =
            GeminiExtractor::with_api_key(&settings, Prompts::default(), Some("key".into()))
                .unwrap();
        assert!(extractor.extract("chest pain").await.is_empty());
    }

    #[tokio::test]
    async fn test_noop_extractor() {
        assert_eq!(NoopExtractor.extract("x").await, MedicalEntities::default());
    }
}

//! Configuration settings for medrag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub vector_index: VectorIndexSettings,
    pub entities: EntitySettings,
    pub search: SearchSettings,
    pub chunking: ChunkingSettings,
    pub catalog: CatalogSettings,
    pub recovery: RecoverySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding the JSON catalogs.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face feature-extraction endpoint (sentence-transformers models).
    #[default]
    HuggingFace,
    /// OpenAI embeddings API.
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(EmbeddingProvider::HuggingFace),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::HuggingFace => write!(f, "huggingface"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Base URL of the feature-extraction service (huggingface provider).
    pub endpoint: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "pritamdeka/BioBERT-mnli-snli-scinli-scitail-mednli-stsb".to_string(),
            endpoint: "https://api-inference.huggingface.co".to_string(),
            dimensions: 768,
            batch_size: 8,
            timeout_secs: 120,
        }
    }
}

/// Managed vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexSettings {
    /// Index name.
    pub name: String,
    /// Data plane host. Resolved through the control plane when unset.
    pub host: Option<String>,
    /// Control plane base URL.
    pub control_url: String,
    /// Number of candidates fetched per query.
    pub top_k: usize,
    /// Vectors per upsert request.
    pub upsert_batch_size: usize,
}

impl Default for VectorIndexSettings {
    fn default() -> Self {
        Self {
            name: "medrag".to_string(),
            host: None,
            control_url: "https://api.pinecone.io".to_string(),
            top_k: 50,
            upsert_batch_size: 100,
        }
    }
}

/// LLM entity extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySettings {
    /// Disable to skip the LLM call and rank by similarity alone.
    pub enabled: bool,
    pub model: String,
    /// Generative Language API base URL.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for EntitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Reranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Score added to matches whose metadata agrees with the extracted entities.
    pub boost: f32,
    /// Maximum number of results returned.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            boost: 1.0,
            max_results: 25,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Word count at which a chunk is emitted.
    pub chunk_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 40 }
    }
}

/// Locations of the JSON catalogs, relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub videos: String,
    pub chunks: String,
    pub diagnoses: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            videos: "video-data.json".to_string(),
            chunks: "chunk-details.json".to_string(),
            diagnoses: "dx.json".to_string(),
        }
    }
}

/// Bulk recovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverySettings {
    /// Failed attempts tolerated before a video is given up on.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub output_dir: String,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_delay_secs: 3,
            output_dir: "data".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::MedragError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medrag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Resolve a path against the data directory unless it is absolute.
    pub fn data_path(&self, name: &str) -> PathBuf {
        let path = Self::expand_path(name);
        if path.is_absolute() {
            path
        } else {
            self.data_dir().join(path)
        }
    }

    pub fn videos_path(&self) -> PathBuf {
        self.data_path(&self.catalog.videos)
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.data_path(&self.catalog.chunks)
    }

    pub fn diagnoses_path(&self) -> PathBuf {
        self.data_path(&self.catalog.diagnoses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 40);
        assert_eq!(settings.vector_index.top_k, 50);
        assert_eq!(settings.vector_index.upsert_batch_size, 100);
        assert_eq!(settings.search.max_results, 25);
        assert_eq!(settings.embedding.batch_size, 8);
        assert_eq!(settings.recovery.max_retries, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 8080

            [search]
            boost = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.search.boost, 0.5);
        assert_eq!(settings.search.max_results, 25);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::OpenAI;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.embedding.provider, EmbeddingProvider::OpenAI);
    }

    #[test]
    fn test_data_path_resolution() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/srv/medrag".to_string();

        assert_eq!(
            settings.videos_path(),
            PathBuf::from("/srv/medrag/video-data.json")
        );

        settings.catalog.diagnoses = "/etc/dx.json".to_string();
        assert_eq!(settings.diagnoses_path(), PathBuf::from("/etc/dx.json"));
    }

    #[test]
    fn test_embedding_provider_parse() {
        assert_eq!(
            "HF".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::HuggingFace
        );
        assert!("cohere".parse::<EmbeddingProvider>().is_err());
    }
}

//! JSON document catalogs: video metadata, chunk details and diagnoses.
//!
//! Each catalog is one JSON object keyed by video URL or chunk ID, read once
//! and rewritten wholesale after every change.

use crate::config::Settings;
use crate::error::{MedragError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Catalogs shared between the search and add routes.
pub type SharedCatalog = Arc<RwLock<Catalog>>;

/// Metadata recorded for every added video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub chief_complaint: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub topics: serde_json::Value,
    /// Unix timestamp (seconds) of when the video was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<i64>,
    /// Keys written by other tools.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Transcript chunk details keyed by chunk ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDetail {
    pub text: String,
    pub start_time: f64,
    pub duration: f64,
    pub chunk_index: usize,
    pub url: String,
}

/// Diagnosis annotations keyed by video URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    #[serde(rename = "Final Dx", default, skip_serializing_if = "Option::is_none")]
    pub final_dx: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A JSON object file mapping keys to records.
#[derive(Debug, Clone)]
pub struct JsonMap<T> {
    path: PathBuf,
    entries: BTreeMap<String, T>,
}

impl<T: Serialize + DeserializeOwned> JsonMap<T> {
    /// Load the map, starting empty if the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                MedragError::Catalog(format!("{} is not valid: {}", path.display(), e))
            })?
        } else {
            debug!("{} not found, starting empty", path.display());
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// An unsaved map at `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Rewrite the whole file, pretty-printed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(key.into(), value)
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = (String, T)>) {
        self.entries.extend(items);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The three catalogs the search service reads and the add route writes.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub videos: JsonMap<VideoRecord>,
    pub chunks: JsonMap<ChunkDetail>,
    pub diagnoses: JsonMap<DiagnosisRecord>,
}

impl Catalog {
    pub fn load(videos: &Path, chunks: &Path, diagnoses: &Path) -> Result<Self> {
        let catalog = Self {
            videos: JsonMap::load(videos)?,
            chunks: JsonMap::load(chunks)?,
            diagnoses: JsonMap::load(diagnoses)?,
        };
        info!(
            videos = catalog.videos.len(),
            chunks = catalog.chunks.len(),
            diagnoses = catalog.diagnoses.len(),
            "Loaded catalogs"
        );
        Ok(catalog)
    }

    /// Load the catalogs at the paths named in the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::load(
            &settings.videos_path(),
            &settings.chunks_path(),
            &settings.diagnoses_path(),
        )
    }

    pub fn shared(self) -> SharedCatalog {
        Arc::new(RwLock::new(self))
    }

    pub fn video(&self, url: &str) -> Option<&VideoRecord> {
        self.videos.get(url)
    }

    pub fn final_dx(&self, url: &str) -> Option<&str> {
        self.diagnoses.get(url).and_then(|d| d.final_dx.as_deref())
    }
}

//! Configuration module for medrag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{EntityPrompts, Prompts};
pub use settings::{
    CatalogSettings, ChunkingSettings, EmbeddingProvider, EmbeddingSettings, EntitySettings,
    GeneralSettings, PromptSettings, RecoverySettings, SearchSettings, ServerSettings, Settings,
    VectorIndexSettings,
};

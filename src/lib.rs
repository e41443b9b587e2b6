//! medrag - Semantic search over medical lecture videos
//!
//! Transcripts of lecture videos are split into word-window chunks, embedded
//! and stored in a vector index. Queries are embedded the same way, and the
//! nearest chunks are reranked with catalog metadata that agrees with the
//! medical entities an LLM pulls out of the query.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `youtube` - Video ID parsing, transcripts and metadata via yt-dlp
//! - `chunking` - Word-window transcript chunking
//! - `embedding` - Embedding providers
//! - `vector_store` - Vector index abstraction (Pinecone, in-memory)
//! - `entities` - LLM medical entity extraction
//! - `catalog` - JSON catalogs of videos, chunks and diagnoses
//! - `search` - Query pipeline and metadata rerank
//! - `ingest` - Add-video pipeline
//! - `server` - HTTP API
//! - `recovery` - Bulk transcript recovery
//! - `images` - Slide image URL patching
//!
//! # Example
//!
//! ```rust,no_run
//! use medrag::catalog::Catalog;
//! use medrag::config::Settings;
//! use medrag::embedding::create_embedder;
//! use medrag::entities::NoopExtractor;
//! use medrag::search::{SearchOptions, SearchService};
//! use medrag::vector_store::PineconeIndex;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let service = SearchService::new(
//!         Arc::new(NoopExtractor),
//!         create_embedder(&settings.embedding)?,
//!         Arc::new(PineconeIndex::from_settings(&settings.vector_index)?),
//!         Catalog::from_settings(&settings)?.shared(),
//!         SearchOptions::new(settings.vector_index.top_k, &settings.search),
//!     );
//!
//!     let response = service.search("chest pain radiating to the jaw").await?;
//!     for hit in response.matches {
//!         println!("{:.3} {} @ {}s", hit.score, hit.url, hit.start_time);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod entities;
pub mod error;
pub mod http;
pub mod images;
pub mod ingest;
pub mod recovery;
pub mod search;
pub mod server;
pub mod vector_store;
pub mod youtube;

pub use error::{MedragError, Result};

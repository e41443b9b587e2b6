//! HTTP API server command.
//!
//! Wires the configured providers into the search and add services and
//! serves them until interrupted.

use crate::catalog::Catalog;
use crate::chunking::WordChunker;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::embedding::create_embedder;
use crate::entities::{EntityExtractor, GeminiExtractor, NoopExtractor};
use crate::ingest::Ingestor;
use crate::search::{SearchOptions, SearchService};
use crate::server::{router, AppState};
use crate::vector_store::{PineconeIndex, VectorIndex};
use crate::youtube::YtDlp;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Serve, &settings)?;

    let state = Arc::new(build_state(&settings)?);
    let app = router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("medrag API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Alive", "GET  /");
    Output::kv("Search", "GET  /search?query=...");
    Output::kv("Add video", "POST /add");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the shared services from settings.
fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let embedder = create_embedder(&settings.embedding)?;
    let index: Arc<dyn VectorIndex> = Arc::new(PineconeIndex::from_settings(&settings.vector_index)?);

    let extractor: Arc<dyn EntityExtractor> = if settings.entities.enabled {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        Arc::new(GeminiExtractor::from_settings(&settings.entities, prompts)?)
    } else {
        info!("Entity extraction disabled, ranking by similarity only");
        Arc::new(NoopExtractor)
    };

    let catalog = Catalog::from_settings(settings)?.shared();

    let search = SearchService::new(
        extractor,
        embedder.clone(),
        index.clone(),
        catalog.clone(),
        SearchOptions::new(settings.vector_index.top_k, &settings.search),
    );
    let ingestor = Ingestor::new(
        Arc::new(YtDlp::new()),
        embedder,
        index,
        catalog,
        WordChunker::new(settings.chunking.chunk_size),
    );

    Ok(AppState { search, ingestor })
}

//! Chunk command: preview how a video would be chunked for indexing.

use crate::chunking::WordChunker;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::youtube::{extract_video_id, TranscriptProvider, YtDlp};

/// Run the chunk command.
pub async fn run_chunk(
    url: &str,
    chunk_size: Option<usize>,
    json: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    preflight::check(Operation::FetchTranscripts, &settings)?;

    let video_id = extract_video_id(url).ok_or_else(|| anyhow::anyhow!("Invalid YouTube URL: {}", url))?;

    let spinner = Output::spinner("Fetching transcript...");
    let transcript = YtDlp::new().fetch_transcript(&video_id).await;
    spinner.finish_and_clear();

    let Some(transcript) = transcript? else {
        Output::error("Transcript not available for this video.");
        return Ok(());
    };

    let chunker = WordChunker::new(chunk_size.unwrap_or(settings.chunking.chunk_size));
    let chunks = chunker.chunk(&transcript);

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    Output::header(&format!("{} ({} chunks)", video_id, chunks.len()));
    for chunk in &chunks {
        Output::chunk(
            chunk.chunk_index,
            &chunk.format_timestamp(),
            chunk.text.split_whitespace().count(),
            &chunk.text,
        );
    }

    Ok(())
}

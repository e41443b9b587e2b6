//! YouTube collaborators: video ID parsing, transcripts and metadata.
//!
//! Transcripts and metadata are fetched through traits so the ingestion and
//! recovery pipelines can run against fakes in tests.

mod ytdlp;

pub use ytdlp::YtDlp;

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One caption line as delivered by the transcript provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl CaptionEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Descriptive metadata about a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    /// Upload date as `YYYYMMDD`.
    pub upload_date: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

/// Source of video transcripts.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the caption track for a video.
    ///
    /// Returns `Ok(None)` when the video has no transcript.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Option<Vec<CaptionEntry>>>;
}

/// Source of video metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_info(&self, video_id: &str) -> Result<VideoInfo>;
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})|^([0-9A-Za-z_-]{11})$")
            .expect("video id regex is valid")
    })
}

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = video_id_regex().captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Take the trailing 11 characters of a URL as its video ID.
pub fn video_id_from_tail(url: &str) -> Option<String> {
    let chars: Vec<char> = url.trim().chars().collect();
    if chars.len() < 11 {
        return None;
    }
    Some(chars[chars.len() - 11..].iter().collect())
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

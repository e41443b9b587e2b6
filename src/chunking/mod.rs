//! Transcript chunking into fixed-size word windows.
//!
//! Caption entries are grouped greedily until the group holds at least
//! `chunk_size` words; each group becomes one searchable chunk.

use crate::youtube::CaptionEntry;
use serde::{Deserialize, Serialize};

/// Default number of words per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 40;

/// A window of transcript text with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Words of the window joined by single spaces.
    pub text: String,
    /// Start time of the first caption in the window (seconds).
    pub start_time: f64,
    /// Sum of the caption durations in the window (seconds).
    pub duration: f64,
    /// Position of this chunk in the video.
    pub chunk_index: usize,
}

impl TranscriptChunk {
    /// Format the start time as MM:SS or HH:MM:SS.
    pub fn format_timestamp(&self) -> String {
        let total_seconds = self.start_time as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// Greedy word-count chunker.
#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    chunk_size: usize,
}

impl WordChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split caption entries into chunks of at least `chunk_size` words.
    ///
    /// The last chunk holds whatever words remain and may be shorter.
    pub fn chunk(&self, entries: &[CaptionEntry]) -> Vec<TranscriptChunk> {
        let mut chunks = Vec::new();
        let mut group = Group::default();

        for entry in entries {
            if group.start.is_none() {
                group.start = Some(entry.start);
            }
            group.words.extend(entry.text.split_whitespace());
            group.duration += entry.duration;

            if group.words.len() >= self.chunk_size {
                chunks.push(group.take(chunks.len()));
            }
        }

        if !group.words.is_empty() {
            chunks.push(group.take(chunks.len()));
        }

        chunks
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[derive(Default)]
struct Group<'a> {
    words: Vec<&'a str>,
    start: Option<f64>,
    duration: f64,
}

impl Group<'_> {
    fn take(&mut self, chunk_index: usize) -> TranscriptChunk {
        let chunk = TranscriptChunk {
            text: self.words.join(" "),
            start_time: self.start.unwrap_or(0.0),
            duration: self.duration,
            chunk_index,
        };
        self.words.clear();
        self.start = None;
        self.duration = 0.0;
        chunk
    }
}

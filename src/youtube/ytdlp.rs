//! yt-dlp backed transcript and metadata provider.

use super::{watch_url, CaptionEntry, MetadataProvider, TranscriptProvider, VideoInfo};
use crate::error::{MedragError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Provider that shells out to `yt-dlp`.
pub struct YtDlp {
    binary: String,
    sub_langs: String,
}

impl YtDlp {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            sub_langs: "en.*,en".to_string(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MedragError::ToolNotFound(self.binary.clone())
                } else {
                    MedragError::VideoSource(format!("Failed to run {}: {}", self.binary, e))
                }
            })
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptProvider for YtDlp {
    #[instrument(skip(self))]
    async fn fetch_transcript(&self, video_id: &str) -> Result<Option<Vec<CaptionEntry>>> {
        let temp_dir = tempfile::tempdir()?;
        let template = temp_dir.path().join(format!("{}.%(ext)s", video_id));
        let template = template.to_string_lossy().to_string();
        let url = watch_url(video_id);

        let output = self
            .run(&[
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs",
                &self.sub_langs,
                "--sub-format",
                "json3",
                "--no-warnings",
                "--quiet",
                "--output",
                &template,
                &url,
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MedragError::VideoSource(format!(
                "yt-dlp failed for {}: {}",
                video_id,
                stderr.trim()
            )));
        }

        let Some(path) = find_caption_file(temp_dir.path(), video_id)? else {
            debug!("No caption track for {}", video_id);
            return Ok(None);
        };

        let raw = tokio::fs::read(&path).await?;
        let entries = parse_json3(&raw)?;
        debug!("Parsed {} caption entries", entries.len());

        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(entries))
    }
}

#[async_trait]
impl MetadataProvider for YtDlp {
    #[instrument(skip(self))]
    async fn fetch_info(&self, video_id: &str) -> Result<VideoInfo> {
        let url = watch_url(video_id);
        let output = self
            .run(&["--dump-json", "--skip-download", "--no-warnings", &url])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MedragError::VideoSource(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            MedragError::VideoSource(format!("Failed to parse yt-dlp output: {}", e))
        })
    }
}

/// Pick the caption file yt-dlp wrote, preferring the plain English track.
fn find_caption_file(dir: &Path, video_id: &str) -> Result<Option<PathBuf>> {
    let preferred = dir.join(format!("{}.en.json3", video_id));
    if preferred.exists() {
        return Ok(Some(preferred));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json3"))
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Convert a json3 caption document into caption entries.
fn parse_json3(raw: &[u8]) -> Result<Vec<CaptionEntry>> {
    let doc: Json3 = serde_json::from_slice(raw)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(CaptionEntry::new(
                text,
                event.t_start_ms / 1000.0,
                event.d_duration_ms / 1000.0,
            ))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let raw = br#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 61000, "id": 1, "wpWinPosId": 1},
                {"tStartMs": 1200, "dDurationMs": 3400, "segs": [{"utf8": "today we"}, {"utf8": " discuss", "tOffsetMs": 800}]},
                {"tStartMs": 4600, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 4610, "dDurationMs": 2500, "segs": [{"utf8": "aortic\nstenosis"}]}
            ]
        }"#;

        let entries = parse_json3(raw).unwrap();
        assert_eq!(
            entries,
            vec![
                CaptionEntry::new("today we discuss", 1.2, 3.4),
                CaptionEntry::new("aortic stenosis", 4.61, 2.5),
            ]
        );
    }

    #[test]
    fn test_parse_json3_without_events() {
        assert!(parse_json3(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_find_caption_file_prefers_english() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.en-orig.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("abc.en.json3"), "{}").unwrap();

        let found = find_caption_file(dir.path(), "abc").unwrap().unwrap();
        assert!(found.ends_with("abc.en.json3"));
    }

    #[test]
    fn test_find_caption_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_caption_file(dir.path(), "abc").unwrap().is_none());

        std::fs::write(dir.path().join("abc.en-US.json3"), "{}").unwrap();
        let found = find_caption_file(dir.path(), "abc").unwrap().unwrap();
        assert!(found.ends_with("abc.en-US.json3"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let provider = YtDlp {
            binary: "medrag-definitely-missing-binary".to_string(),
            sub_langs: "en".to_string(),
        };
        let err = provider.fetch_info("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, MedragError::ToolNotFound(_)));
    }
}

//! Bulk recovery of transcripts and metadata for a list of videos.
//!
//! Each selected video is retried with a fixed delay until both its transcript
//! and its metadata arrive or the retry budget runs out. Results land in
//! `{output_dir}/{n}.json`, numbered from 1 in selection order.

use crate::config::RecoverySettings;
use crate::error::{MedragError, Result};
use crate::youtube::{video_id_from_tail, CaptionEntry, MetadataProvider, TranscriptProvider, VideoInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Line indices (0-based) of the URL list recovered when no selection is given.
pub const DEFAULT_SELECTION: &[usize] = &[
    2, 12, 30, 40, 145, 155, 161, 174, 190, 224, 240, 249, 267, 291, 317, 394, 411, 432, 475, 488,
    534, 541, 560, 581, 717, 758, 791, 831, 887, 920, 980, 984, 985, 987, 988, 989, 1024, 1027,
    1030, 1036, 1052, 1087, 1094, 1095, 1096, 1097, 1098, 1099, 1100, 1101, 1102, 1103, 1104, 1105,
    1106, 1107, 1108, 1109, 1110, 1111, 1112, 1113, 1114, 1115, 1116, 1117, 1118, 1119, 1120, 1121,
    1122, 1123, 1124, 1125, 1126, 1127, 1128, 1129, 1130, 1131, 1132, 1133, 1134, 1135, 1136, 1137,
    1138, 1139, 1140, 1141, 1142, 1143, 1144, 1145, 1146, 1147, 1148, 1149, 1150, 1151, 1152, 1153,
    1154, 1155, 1156, 1157, 1158, 1159, 1160, 1161, 1162, 1163, 1164, 1165, 1166, 1167, 1168, 1169,
    1170, 1171, 1172, 1173, 1174, 1175, 1176, 1177, 1178, 1179, 1180, 1181, 1182, 1183, 1184, 1185,
    1186, 1187, 1188, 1189, 1190, 1191, 1192, 1193, 1194, 1195, 1196, 1197, 1198, 1199, 1200, 1201,
    1202, 1203, 1204, 1205, 1206, 1207, 1208, 1209, 1210, 1211, 1212, 1213, 1214, 1215, 1216, 1217,
    1218, 1219, 1220, 1221, 1222, 1223, 1224, 1225, 1226, 1227, 1228, 1229, 1230, 1231, 1232, 1233,
    1234, 1235, 1236,
];

/// One recovered video as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveredVideo {
    pub metadata: VideoInfo,
    pub transcript_data: Vec<CaptionEntry>,
}

/// Outcome of a recovery run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryReport {
    /// 1-based positions that were written.
    pub succeeded: Vec<usize>,
    /// 1-based positions that exhausted their retries.
    pub failed: Vec<usize>,
}

/// Read a newline separated URL list.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.split('\n').map(|l| l.trim().to_string()).collect())
}

/// Pick the URLs at the given line indices, skipping out-of-range and blank lines.
pub fn select_urls(lines: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&i| match lines.get(i) {
            Some(url) if !url.is_empty() => Some(url.clone()),
            Some(_) => {
                warn!("Line {} of the URL list is blank, skipping", i);
                None
            }
            None => {
                warn!("Line {} is past the end of the URL list, skipping", i);
                None
            }
        })
        .collect()
}

/// Parse a comma separated list of indices.
pub fn parse_indices(raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| MedragError::InvalidInput(format!("Invalid index: {}", s)))
        })
        .collect()
}

/// Retry policy for a recovery run.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl From<&RecoverySettings> for RetryPolicy {
    fn from(settings: &RecoverySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            delay: Duration::from_secs(settings.retry_delay_secs),
        }
    }
}

/// Sequential recovery driver.
pub struct Recovery {
    transcripts: Arc<dyn TranscriptProvider>,
    metadata: Arc<dyn MetadataProvider>,
    output_dir: PathBuf,
    policy: RetryPolicy,
}

impl Recovery {
    pub fn new(
        transcripts: Arc<dyn TranscriptProvider>,
        metadata: Arc<dyn MetadataProvider>,
        output_dir: impl Into<PathBuf>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transcripts,
            metadata,
            output_dir: output_dir.into(),
            policy,
        }
    }

    /// Recover every URL; `on_progress` is called after each one.
    pub async fn run<F>(&self, urls: &[String], mut on_progress: F) -> Result<RecoveryReport>
    where
        F: FnMut(usize, bool),
    {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut report = RecoveryReport::default();
        let total = urls.len();

        for (position, url) in urls.iter().enumerate() {
            let index = position + 1;
            let Some(video_id) = video_id_from_tail(url) else {
                warn!("Cannot take a video ID from '{}', skipping {}/{}", url, index, total);
                report.failed.push(index);
                on_progress(index, false);
                continue;
            };

            info!("trying for: {} {}/{}", video_id, index, total);
            let ok = self.recover_one(&video_id, index, total).await?;
            if ok {
                report.succeeded.push(index);
            } else {
                report.failed.push(index);
            }
            on_progress(index, ok);
        }

        Ok(report)
    }

    /// Retry one video; `Ok(false)` once the budget is spent.
    #[instrument(skip(self))]
    async fn recover_one(&self, video_id: &str, index: usize, total: usize) -> Result<bool> {
        let mut failures = 0u32;

        let path = self.output_dir.join(format!("{}.json", index));

        loop {
            match self.attempt(video_id, &path).await {
                Ok(()) => {
                    info!("success! {}/{}", index, total);
                    return Ok(true);
                }
                Err(e) => {
                    failures += 1;
                    warn!("error! trying again {}/{}: {}", index, total, e);
                    if failures > self.policy.max_retries {
                        return Ok(false);
                    }
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }

    /// Fetch and write one video; any failure counts against the retry budget.
    async fn attempt(&self, video_id: &str, path: &Path) -> Result<()> {
        let video = self.fetch(video_id).await?;
        std::fs::write(path, serde_json::to_string_pretty(&video)?)?;
        Ok(())
    }

    async fn fetch(&self, video_id: &str) -> Result<RecoveredVideo> {
        let transcript_data = self
            .transcripts
            .fetch_transcript(video_id)
            .await?
            .ok_or(MedragError::TranscriptUnavailable)?;
        let metadata = self.metadata.fetch_info(video_id).await?;
        Ok(RecoveredVideo {
            metadata,
            transcript_data,
        })
    }
}

//! Recover command: bulk transcript and metadata download.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::recovery::{parse_indices, read_url_list, select_urls, Recovery, RetryPolicy, DEFAULT_SELECTION};
use crate::youtube::YtDlp;
use std::path::Path;
use std::sync::Arc;

/// Run the recover command.
pub async fn run_recover(
    urls: &str,
    indices: Option<&str>,
    all: bool,
    output: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    preflight::check(Operation::FetchTranscripts, &settings)?;

    let lines = read_url_list(Path::new(urls))?;
    let selected: Vec<String> = if all {
        lines.into_iter().filter(|l| !l.is_empty()).collect()
    } else {
        let indices = match indices {
            Some(raw) => parse_indices(raw)?,
            None => DEFAULT_SELECTION.to_vec(),
        };
        select_urls(&lines, &indices)
    };

    if selected.is_empty() {
        Output::warning("No URLs selected.");
        return Ok(());
    }

    let output_dir = output.unwrap_or_else(|| settings.recovery.output_dir.clone());
    let output_dir = Settings::expand_path(&output_dir);

    Output::info(&format!(
        "Recovering {} videos into {}",
        selected.len(),
        output_dir.display()
    ));

    let provider = Arc::new(YtDlp::new());
    let recovery = Recovery::new(
        provider.clone(),
        provider,
        output_dir.clone(),
        RetryPolicy::from(&settings.recovery),
    );

    let pb = Output::progress_bar(selected.len() as u64, "recovering");
    let report = recovery
        .run(&selected, |_, ok| {
            pb.inc(1);
            if !ok {
                pb.set_message("some failed");
            }
        })
        .await?;
    pb.finish_and_clear();

    Output::success(&format!("Recovered {} videos", report.succeeded.len()));
    if !report.failed.is_empty() {
        let positions: Vec<String> = report.failed.iter().map(|i| i.to_string()).collect();
        Output::warning(&format!(
            "{} gave up after retries: {}",
            report.failed.len(),
            positions.join(", ")
        ));
    }

    Ok(())
}

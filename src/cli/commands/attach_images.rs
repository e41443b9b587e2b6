//! Attach-images command.

use crate::cli::Output;
use crate::images::attach_files;
use std::path::Path;

/// Run the attach-images command.
pub fn run_attach_images(data: &str, images: &str, output: &str) -> anyhow::Result<()> {
    let summary = attach_files(Path::new(data), Path::new(images), Path::new(output))?;

    Output::success(&format!(
        "Linked {} of {} entries, wrote {}",
        summary.linked, summary.entries, output
    ));
    if summary.linked < summary.entries {
        Output::warning(&format!(
            "{} entries have no matching image (slide_url is null)",
            summary.entries - summary.linked
        ));
    }

    Ok(())
}

//! Attach slide image URLs to a dataset.
//!
//! The dataset maps a video URL to an object naming its `slide`; the image
//! list maps file names to hosted URLs. Each entry gains a `slide_url`.

use crate::error::{MedragError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// One uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntry {
    pub filename: String,
    pub url: String,
}

/// Counts from one patch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachSummary {
    pub entries: usize,
    pub linked: usize,
}

/// Set `slide_url` on every object entry of `data`.
///
/// The URL is the one whose image file name equals the entry's `slide`, or
/// null when there is none. Non-object entries are left untouched.
pub fn attach_image_urls(data: &mut Map<String, Value>, images: &[ImageEntry]) -> AttachSummary {
    let by_name: HashMap<&str, &str> = images
        .iter()
        .map(|img| (img.filename.as_str(), img.url.as_str()))
        .collect();

    let mut summary = AttachSummary::default();
    for (key, entry) in data.iter_mut() {
        let Some(obj) = entry.as_object_mut() else {
            debug!("Entry {} is not an object, leaving it alone", key);
            continue;
        };
        summary.entries += 1;

        let url = obj
            .get("slide")
            .and_then(Value::as_str)
            .and_then(|slide| by_name.get(slide).copied());
        if url.is_some() {
            summary.linked += 1;
        }
        obj.insert(
            "slide_url".to_string(),
            url.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null),
        );
    }

    summary
}

/// Serialize with a 4-space indent.
pub fn to_string_indent4<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| MedragError::InvalidInput(e.to_string()))
}

/// Read `data` and `images`, patch, and write the result to `output`.
pub fn attach_files(data: &Path, images: &Path, output: &Path) -> Result<AttachSummary> {
    let mut dataset: Map<String, Value> = serde_json::from_str(&std::fs::read_to_string(data)?)?;
    let image_list: Vec<ImageEntry> = serde_json::from_str(&std::fs::read_to_string(images)?)?;

    let summary = attach_image_urls(&mut dataset, &image_list);
    std::fs::write(output, to_string_indent4(&dataset)?)?;

    info!(
        entries = summary.entries,
        linked = summary.linked,
        "Wrote {}",
        output.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn images() -> Vec<ImageEntry> {
        vec![
            ImageEntry {
                filename: "slide-1.png".to_string(),
                url: "https://cdn.example/slide-1.png".to_string(),
            },
            ImageEntry {
                filename: "slide-2.png".to_string(),
                url: "https://cdn.example/slide-2.png".to_string(),
            },
        ]
    }

    #[test]
    fn test_attach_image_urls() {
        let mut data = json!({
            "u1": {"slide": "slide-2.png", "title": "ECG basics"},
            "u2": {"slide": "missing.png"},
            "u3": {"title": "no slide"},
            "u4": "not an object"
        })
        .as_object()
        .cloned()
        .unwrap();

        let summary = attach_image_urls(&mut data, &images());

        assert_eq!(summary, AttachSummary { entries: 3, linked: 1 });
        assert_eq!(data["u1"]["slide_url"], "https://cdn.example/slide-2.png");
        assert_eq!(data["u1"]["title"], "ECG basics");
        assert!(data["u2"]["slide_url"].is_null());
        assert!(data["u3"]["slide_url"].is_null());
        assert_eq!(data["u4"], "not an object");
    }

    #[test]
    fn test_attach_keeps_entry_order() {
        let mut data: Map<String, Value> =
            serde_json::from_str(r#"{"zeta": {"slide": "slide-1.png"}, "alpha": {"title": "t", "slide": "x"}}"#)
                .unwrap();
        attach_image_urls(&mut data, &images());

        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        let inner: Vec<&str> = data["alpha"].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(inner, vec!["title", "slide", "slide_url"]);
    }

    #[test]
    fn test_indent4() {
        let out = to_string_indent4(&json!({"a": {"b": 1}})).unwrap();
        assert_eq!(out, "{\n    \"a\": {\n        \"b\": 1\n    }\n}");
    }

    #[test]
    fn test_attach_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        let imgs = dir.path().join("images.json");
        let out = dir.path().join("final.json");
        std::fs::write(&data, r#"{"u1": {"slide": "slide-1.png"}}"#).unwrap();
        std::fs::write(&imgs, serde_json::to_string(&images()).unwrap()).unwrap();

        let summary = attach_files(&data, &imgs, &out).unwrap();
        assert_eq!(summary.linked, 1);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["u1"]["slide_url"], "https://cdn.example/slide-1.png");
    }
}

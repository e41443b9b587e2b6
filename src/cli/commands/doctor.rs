//! Doctor command - verify system requirements and configuration.

use crate::catalog::{ChunkDetail, DiagnosisRecord, JsonMap, VideoRecord};
use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use crate::embedding::HF_TOKEN_ENV;
use crate::entities::API_KEY_ENV as GEMINI_API_KEY_ENV;
use crate::http::env_secret;
use crate::vector_store::PINECONE_API_KEY_ENV;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("medrag Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let sections = [
        ("External Tools", vec![check_tool("yt-dlp", install_hint_ytdlp())]),
        ("API Keys", check_api_keys(settings)),
        ("Catalogs", check_catalogs(settings)),
        ("Configuration", vec![check_config_file()]),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before starting the server.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! medrag is ready to serve.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![check_key(
        PINECONE_API_KEY_ENV,
        env_secret(PINECONE_API_KEY_ENV),
        true,
        "vector queries and upserts",
    )];

    results.push(match settings.embedding.provider {
        EmbeddingProvider::HuggingFace => check_key(
            HF_TOKEN_ENV,
            env_secret(HF_TOKEN_ENV),
            false,
            "anonymous inference is heavily rate limited",
        ),
        EmbeddingProvider::OpenAI => check_key(
            "OPENAI_API_KEY",
            env_secret("OPENAI_API_KEY"),
            true,
            "query and chunk embeddings",
        ),
    });

    if settings.entities.enabled {
        results.push(check_key(
            GEMINI_API_KEY_ENV,
            env_secret(GEMINI_API_KEY_ENV),
            false,
            "without it searches skip the metadata boost",
        ));
    } else {
        results.push(CheckResult::ok(GEMINI_API_KEY_ENV, "entity extraction disabled"));
    }

    results
}

fn check_key(name: &str, value: Option<String>, required: bool, purpose: &str) -> CheckResult {
    match value {
        Some(key) => CheckResult::ok(name, &format!("configured ({})", mask(&key))),
        None => {
            let hint = format!("Set with: export {}='...' ({})", name, purpose);
            if required {
                CheckResult::error(name, "not set", &hint)
            } else {
                CheckResult::warning(name, "not set", &hint)
            }
        }
    }
}

/// Show only the ends of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_catalogs(settings: &Settings) -> Vec<CheckResult> {
    vec![
        check_catalog::<VideoRecord>("Videos", &settings.videos_path()),
        check_catalog::<ChunkDetail>("Chunks", &settings.chunks_path()),
        check_catalog::<DiagnosisRecord>("Diagnoses", &settings.diagnoses_path()),
    ]
}

fn check_catalog<T>(name: &str, path: &Path) -> CheckResult
where
    T: serde::de::DeserializeOwned + serde::Serialize,
{
    if !path.exists() {
        return CheckResult::warning(
            name,
            &format!("{} (not created yet)", path.display()),
            "Starts empty; the add route creates it",
        );
    }
    match JsonMap::<T>::load(path) {
        Ok(map) => CheckResult::ok(name, &format!("{} ({} entries)", path.display(), map.len())),
        Err(e) => CheckResult::error(
            name,
            &format!("{} is unreadable: {}", path.display(), e),
            "Fix or remove the file",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: medrag config init",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

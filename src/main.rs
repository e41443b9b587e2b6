//! medrag CLI entry point.

use anyhow::Result;
use clap::Parser;
use medrag::cli::{commands, Cli, Commands};
use medrag::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging; -v flags override the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("medrag={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Recover {
            urls,
            indices,
            all,
            output,
        } => {
            commands::run_recover(urls, indices.as_deref(), *all, output.clone(), settings).await?;
        }

        Commands::AttachImages { data, images, output } => {
            commands::run_attach_images(data, images, output)?;
        }

        Commands::Chunk {
            url,
            chunk_size,
            json,
        } => {
            commands::run_chunk(url, *chunk_size, *json, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}

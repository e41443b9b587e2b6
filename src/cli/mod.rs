//! CLI module for medrag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// medrag - Semantic search over medical lecture videos
///
/// Serves the search and add API, and carries the maintenance tools that
/// rebuild the dataset behind it.
#[derive(Parser, Debug)]
#[command(name = "medrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Recover transcripts and metadata for selected lines of a URL list
    Recover {
        /// Newline separated list of video URLs
        #[arg(default_value = "urls.txt")]
        urls: String,

        /// Comma separated 0-based line indices (defaults to the built-in selection)
        #[arg(short, long, conflicts_with = "all")]
        indices: Option<String>,

        /// Recover every line of the list
        #[arg(long)]
        all: bool,

        /// Output directory (defaults to recovery.output_dir)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Attach slide image URLs to a dataset
    AttachImages {
        /// Dataset keyed by video URL
        #[arg(long, default_value = "data.json")]
        data: String,

        /// Uploaded image list
        #[arg(long, default_value = "images.json")]
        images: String,

        /// Patched dataset destination
        #[arg(short, long, default_value = "final.json")]
        output: String,
    },

    /// Fetch a transcript and print the chunks it would be indexed as
    Chunk {
        /// YouTube URL or video ID
        url: String,

        /// Words per chunk (defaults to chunking.chunk_size)
        #[arg(short = 's', long)]
        chunk_size: Option<usize>,

        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file if none exists
    Init,
}

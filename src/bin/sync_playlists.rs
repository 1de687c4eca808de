#![forbid(unsafe_code)]

//! Refreshes the static playlist catalog.
//!
//! For every enabled source in `playlists.config.json` this asks yt-dlp for
//! the flat playlist, the per-video metadata and the format table, writes one
//! manifest per playlist plus `catalog.json`, and mirrors the content tree
//! into the public web root.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use playlist_catalog_tools::catalog::{ContentPaths, SyncOptions, sync_catalog};
use playlist_catalog_tools::config::{RuntimeOverrides, resolve_runtime_paths};
use playlist_catalog_tools::provider::YtDlp;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sync_playlists")]
#[command(about = "Rebuild playlist manifests and the catalog from yt-dlp metadata")]
struct SyncArgs {
    /// Directory holding playlists.config.json, quizzes.json and manifests.
    #[arg(long)]
    content_root: Option<PathBuf>,

    /// Directory the content tree is published to.
    #[arg(long)]
    public_root: Option<PathBuf>,

    /// yt-dlp executable.
    #[arg(long = "yt-dlp")]
    ytdlp: Option<PathBuf>,

    /// Number of videos fetched concurrently.
    #[arg(long)]
    jobs: Option<usize>,

    /// Only sync these playlist ids (repeatable).
    #[arg(long = "only", value_name = "PLAYLIST_ID")]
    only: Vec<String>,

    /// Alternate .env file.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

impl SyncArgs {
    fn overrides(&self) -> RuntimeOverrides {
        RuntimeOverrides {
            content_root: self.content_root.clone(),
            public_root: self.public_root.clone(),
            ytdlp_bin: self.ytdlp.clone(),
            jobs: self.jobs,
            env_path: self.env_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = SyncArgs::parse();
    let runtime = resolve_runtime_paths(args.overrides())?;
    let paths = ContentPaths::from_runtime(&runtime);

    let provider = YtDlp::new(runtime.ytdlp_bin.clone()).with_cookies(&paths.cookies);
    provider
        .ensure_available()
        .context("checking yt-dlp installation")?;

    info!("Content root: {}", paths.content_root.display());
    info!("Public root: {}", paths.public_root.display());
    info!("Concurrent fetches: {}", runtime.jobs);

    let options = SyncOptions {
        jobs: runtime.jobs,
        only: args.only,
    };
    sync_catalog(Arc::new(provider), &paths, &options, Utc::now()).await?;

    Ok(())
}

#![forbid(unsafe_code)]

//! Access to the external metadata provider. The catalog assembler only sees
//! the [`MetadataProvider`] trait; [`YtDlp`] is the production implementation.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;

/// Raw text sources for one playlist sync.
///
/// The listing is required for a playlist to sync at all. Per-video payloads
/// are best effort: `None` means the video (or its format table) is
/// unavailable and the caller decides whether to skip it.
pub trait MetadataProvider: Send + Sync {
    /// Newline-delimited JSON, one entry per playlist item.
    fn flat_listing(&self, source_url: &str) -> Result<String>;

    /// Full JSON metadata for a single video.
    fn video_details(&self, video_url: &str) -> Option<String>;

    /// Human-readable format table for a single video.
    fn format_table(&self, video_url: &str) -> Option<String>;
}

/// Shells out to the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookies: None,
        }
    }

    /// Passes `--cookies` on every call when the file exists.
    pub fn with_cookies(mut self, cookies: &Path) -> Self {
        self.cookies = cookies.exists().then(|| cookies.to_path_buf());
        self
    }

    /// Fails when the binary is missing or does not answer `--version`.
    pub fn ensure_available(&self) -> Result<()> {
        let status = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(_) => bail!(
                "{} is installed but returned a failure status",
                self.binary.display()
            ),
            Err(err) => bail!(
                "{} is not installed or not in PATH: {}",
                self.binary.display(),
                err
            ),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(cookies) = &self.cookies {
            command.arg("--cookies").arg(cookies);
        }
        command
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("running yt-dlp {}", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "yt-dlp failed for args [{}] (status {})\n{}",
                args.join(" "),
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("yt-dlp output is not valid UTF-8")
    }

    fn run_optional(&self, args: &[&str]) -> Option<String> {
        match self.run(args) {
            Ok(stdout) => Some(stdout),
            Err(err) => {
                warn!("yt-dlp warning: {err:#}");
                None
            }
        }
    }
}

impl MetadataProvider for YtDlp {
    fn flat_listing(&self, source_url: &str) -> Result<String> {
        self.run(&["--flat-playlist", "--dump-json", source_url])
    }

    fn video_details(&self, video_url: &str) -> Option<String> {
        self.run_optional(&["-J", "--skip-download", video_url])
    }

    fn format_table(&self, video_url: &str) -> Option<String> {
        self.run_optional(&["-F", video_url])
    }
}

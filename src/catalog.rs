#![forbid(unsafe_code)]

//! Catalog assembler.
//!
//! Reads the configured playlist sources, asks the metadata provider for each
//! listing and per-video payloads, normalizes every video into a
//! [`BuiltEpisode`] and writes one manifest per playlist plus the top-level
//! `catalog.json`. The finished content tree is then mirrored into the public
//! web root.
//!
//! Tolerance for unavailable or broken videos lives here, not in the core:
//! a video that cannot be fetched, parsed or built is skipped with a warning,
//! while a listing that cannot be fetched or parsed aborts the run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::RuntimePaths;
use crate::episode::{BuiltEpisode, EpisodeInput, build_episode_at, watch_url};
use crate::extract::format_instant;
use crate::provider::MetadataProvider;
use crate::records::{RawDetailMetadata, RawListingEntry, parse_listing};

pub const PLAYLISTS_CONFIG_FILE: &str = "playlists.config.json";
pub const QUIZZES_FILE: &str = "quizzes.json";
pub const CATALOG_FILE: &str = "catalog.json";
pub const PLAYLISTS_SUBDIR: &str = "playlists";
pub const COOKIES_FILE: &str = "cookies.txt";

/// One entry of `playlists.config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSource {
    pub id: String,
    pub playlist_id: String,
    pub source_url: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub channel_handle: String,
    #[serde(default)]
    pub enabled: bool,
}

/// Video id to quiz questions. Questions are passed through untouched.
pub type QuizStore = HashMap<String, Vec<Value>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistManifest {
    pub id: String,
    pub playlist_id: String,
    pub playlist_title: String,
    pub channel_name: String,
    pub channel_handle: String,
    pub source_url: String,
    pub updated_at: String,
    pub episodes: Vec<BuiltEpisode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub updated_at: String,
    pub playlists: Vec<PlaylistManifest>,
}

/// Every filesystem location the sync touches.
#[derive(Debug, Clone)]
pub struct ContentPaths {
    pub content_root: PathBuf,
    pub public_root: PathBuf,
    pub playlists_dir: PathBuf,
    pub sources_config: PathBuf,
    pub quizzes: PathBuf,
    pub catalog: PathBuf,
    pub cookies: PathBuf,
}

impl ContentPaths {
    pub fn new(content_root: &Path, public_root: &Path) -> Self {
        Self {
            content_root: content_root.to_path_buf(),
            public_root: public_root.to_path_buf(),
            playlists_dir: content_root.join(PLAYLISTS_SUBDIR),
            sources_config: content_root.join(PLAYLISTS_CONFIG_FILE),
            quizzes: content_root.join(QUIZZES_FILE),
            catalog: content_root.join(CATALOG_FILE),
            cookies: content_root.join(COOKIES_FILE),
        }
    }

    pub fn from_runtime(runtime: &RuntimePaths) -> Self {
        Self::new(&runtime.content_root, &runtime.public_root)
    }

    pub fn prepare(&self) -> Result<()> {
        for dir in [&self.playlists_dir, &self.public_root] {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn manifest_path(&self, playlist_id: &str) -> PathBuf {
        self.playlists_dir.join(format!("{playlist_id}.json"))
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of videos fetched concurrently.
    pub jobs: usize,
    /// When non-empty, only these enabled playlist ids are synced.
    pub only: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            only: Vec::new(),
        }
    }
}

/// Reads a JSON file, returning `fallback` when it does not exist.
pub fn load_json_file<T: DeserializeOwned>(path: &Path, fallback: T) -> Result<T> {
    if !path.exists() {
        return Ok(fallback);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_sources(path: &Path) -> Result<Vec<PlaylistSource>> {
    load_json_file(path, Vec::new())
}

pub fn load_quizzes(path: &Path) -> Result<QuizStore> {
    load_json_file(path, QuizStore::new())
}

/// Pretty JSON with a trailing newline, written through a temp file so
/// readers never see a half-written manifest.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    let mut payload = serde_json::to_vec_pretty(value)?;
    payload.push(b'\n');
    fs::write(&tmp_path, payload).with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

/// Enabled sources in config order, narrowed to `only` when it is set.
pub fn select_sources(sources: &[PlaylistSource], only: &[String]) -> Vec<PlaylistSource> {
    for wanted in only {
        if !sources.iter().any(|source| source.enabled && &source.id == wanted) {
            warn!("Requested playlist {wanted} is not an enabled source");
        }
    }
    sources
        .iter()
        .filter(|source| source.enabled)
        .filter(|source| only.is_empty() || only.contains(&source.id))
        .cloned()
        .collect()
}

/// Runs a full sync and returns the catalog that was written.
pub async fn sync_catalog(
    provider: Arc<dyn MetadataProvider>,
    paths: &ContentPaths,
    options: &SyncOptions,
    now: DateTime<Utc>,
) -> Result<CatalogDocument> {
    paths.prepare()?;

    let sources = load_sources(&paths.sources_config)?;
    let quizzes = load_quizzes(&paths.quizzes)?;
    let selected = select_sources(&sources, &options.only);
    let updated_at = format_instant(now);

    let mut manifests = Vec::new();
    for source in &selected {
        info!("Sync playlist {} ({}) ...", source.id, source.playlist_id);
        let Some(manifest) = sync_playlist(
            Arc::clone(&provider),
            source,
            &quizzes,
            &updated_at,
            options.jobs,
            now,
        )
        .await?
        else {
            continue;
        };

        let manifest_path = paths.manifest_path(&source.id);
        write_json_atomic(&manifest_path, &manifest)?;
        info!(
            "Wrote {} episode(s) to {}",
            manifest.episodes.len(),
            manifest_path.display()
        );
        manifests.push(manifest);
    }

    let catalog = CatalogDocument {
        updated_at,
        playlists: manifests,
    };
    write_json_atomic(&paths.catalog, &catalog)?;
    publish_content(&paths.content_root, &paths.public_root)?;

    info!("Synced {} playlists.", catalog.playlists.len());
    Ok(catalog)
}

struct FetchedVideo {
    details: Option<String>,
    format_table: Option<String>,
}

fn fetch_video(provider: &dyn MetadataProvider, video_id: &str) -> FetchedVideo {
    let url = watch_url(video_id);
    let details = provider.video_details(&url);
    // The format table is only worth fetching for videos that exist.
    let format_table = details.as_ref().and_then(|_| provider.format_table(&url));
    FetchedVideo {
        details,
        format_table,
    }
}

/// Builds the manifest for one playlist, or `None` when the listing is empty.
pub async fn sync_playlist(
    provider: Arc<dyn MetadataProvider>,
    source: &PlaylistSource,
    quizzes: &QuizStore,
    updated_at: &str,
    jobs: usize,
    now: DateTime<Utc>,
) -> Result<Option<PlaylistManifest>> {
    let listing = {
        let provider = Arc::clone(&provider);
        let source_url = source.source_url.clone();
        tokio::task::spawn_blocking(move || provider.flat_listing(&source_url))
            .await
            .context("listing task panicked")?
            .with_context(|| format!("fetching listing for playlist {}", source.id))?
    };
    let entries = parse_listing(&listing)
        .with_context(|| format!("parsing listing for playlist {}", source.id))?;

    let Some(first) = entries.first() else {
        warn!("No entries found for playlist {}", source.id);
        return Ok(None);
    };
    let playlist_title = first
        .playlist_title
        .as_str()
        .unwrap_or(source.id.as_str())
        .to_owned();
    let channel_name = first
        .playlist_channel
        .as_str()
        .unwrap_or(source.channel_name.as_str())
        .to_owned();
    let channel_handle = first
        .playlist_uploader_id
        .as_str()
        .unwrap_or(source.channel_handle.as_str())
        .to_owned();

    let limiter = Arc::new(Semaphore::new(jobs.max(1)));
    let mut handles = Vec::with_capacity(entries.len());
    for entry in &entries {
        let permit = Arc::clone(&limiter)
            .acquire_owned()
            .await
            .context("fetch limiter closed")?;
        let provider = Arc::clone(&provider);
        let video_id = entry
            .id
            .as_str()
            .filter(|id| !id.trim().is_empty())
            .map(str::to_owned);
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            video_id.map(|id| fetch_video(provider.as_ref(), &id))
        }));
    }

    let mut episodes = Vec::with_capacity(entries.len());
    for ((index, entry), handle) in entries.iter().enumerate().zip(handles) {
        let fetched = handle.await.context("metadata task panicked")?;
        let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if let Some(episode) = assemble_episode(entry, fetched, position, quizzes, source, now) {
            episodes.push(episode);
        }
    }

    Ok(Some(PlaylistManifest {
        id: source.id.clone(),
        playlist_id: source.playlist_id.clone(),
        playlist_title,
        channel_name,
        channel_handle,
        source_url: source.source_url.clone(),
        updated_at: updated_at.to_owned(),
        episodes,
    }))
}

fn assemble_episode(
    entry: &RawListingEntry,
    fetched: Option<FetchedVideo>,
    position: u32,
    quizzes: &QuizStore,
    source: &PlaylistSource,
    now: DateTime<Utc>,
) -> Option<BuiltEpisode> {
    let label = entry.id.as_str().unwrap_or("<missing id>");
    let (detail, format_table) = match fetched {
        // No usable id: let the builder reject the entry.
        None => (RawDetailMetadata::default(), String::new()),
        Some(FetchedVideo { details: None, .. }) => {
            warn!(
                "Skipping unavailable video {label} in playlist {}",
                source.id
            );
            return None;
        }
        Some(FetchedVideo {
            details: Some(raw),
            format_table,
        }) => match RawDetailMetadata::from_json(&raw) {
            Ok(detail) => (detail, format_table.unwrap_or_default()),
            Err(err) => {
                warn!(
                    "Skipping malformed metadata for video {label} in playlist {}: {err}",
                    source.id
                );
                return None;
            }
        },
    };

    let quiz = entry
        .id
        .as_str()
        .and_then(|id| quizzes.get(id))
        .cloned()
        .unwrap_or_default();

    let input = EpisodeInput {
        entry,
        detail: &detail,
        position_fallback: position,
        format_text: &format_table,
        quiz,
    };
    match build_episode_at(input, now) {
        Ok(episode) => Some(episode),
        Err(err) => {
            warn!(
                "Skipping listing entry #{position} in playlist {}: {err}",
                source.id
            );
            None
        }
    }
}

/// Mirrors the content tree into the public root, overwriting existing
/// files. The cookies file is never published.
pub fn publish_content(content_root: &Path, public_root: &Path) -> Result<usize> {
    fs::create_dir_all(public_root)
        .with_context(|| format!("creating {}", public_root.display()))?;
    let public_canonical = public_root.canonicalize().ok();
    let mut copied = 0;

    for entry in WalkDir::new(content_root).min_depth(1) {
        let entry =
            entry.with_context(|| format!("walking {}", content_root.display()))?;
        let path = entry.path();
        if let Some(public) = &public_canonical
            && path.canonicalize().is_ok_and(|canonical| canonical.starts_with(public))
        {
            continue;
        }
        let relative = path
            .strip_prefix(content_root)
            .with_context(|| format!("resolving {}", path.display()))?;
        if relative == Path::new(COOKIES_FILE) {
            continue;
        }
        let target = public_root.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("creating {}", target.display()))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::copy(path, &target).with_context(|| {
                format!("copying {} to {}", path.display(), target.display())
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::FrenchAvailability;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    /// In-memory provider keyed by URL.
    #[derive(Default)]
    struct FakeProvider {
        listings: HashMap<String, String>,
        details: HashMap<String, String>,
        formats: HashMap<String, String>,
        delays: HashMap<String, Duration>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn listing(mut self, url: &str, lines: &[Value]) -> Self {
            let raw = lines
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            self.listings.insert(url.to_owned(), raw);
            self
        }

        fn raw_listing(mut self, url: &str, raw: &str) -> Self {
            self.listings.insert(url.to_owned(), raw.to_owned());
            self
        }

        fn video(mut self, id: &str, details: &str, formats: &str) -> Self {
            self.details.insert(watch_url(id), details.to_owned());
            self.formats.insert(watch_url(id), formats.to_owned());
            self
        }

        fn delay(mut self, id: &str, delay: Duration) -> Self {
            self.delays.insert(watch_url(id), delay);
            self
        }
    }

    impl MetadataProvider for FakeProvider {
        fn flat_listing(&self, source_url: &str) -> Result<String> {
            self.listings
                .get(source_url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no listing for {source_url}"))
        }

        fn video_details(&self, video_url: &str) -> Option<String> {
            self.requested.lock().unwrap().push(video_url.to_owned());
            if let Some(delay) = self.delays.get(video_url) {
                std::thread::sleep(*delay);
            }
            self.details.get(video_url).cloned()
        }

        fn format_table(&self, video_url: &str) -> Option<String> {
            self.formats.get(video_url).cloned()
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 22, 8, 30, 0).unwrap()
    }

    fn source(id: &str, url: &str, enabled: bool) -> Value {
        json!({
            "id": id,
            "playlistId": format!("PL-{id}"),
            "sourceUrl": url,
            "channelName": "Config Channel",
            "channelHandle": "@config",
            "enabled": enabled
        })
    }

    fn temp_content(sources: &[Value], quizzes: Value) -> (tempfile::TempDir, ContentPaths) {
        let dir = tempdir().unwrap();
        let paths = ContentPaths::new(&dir.path().join("content"), &dir.path().join("public/content"));
        fs::create_dir_all(&paths.content_root).unwrap();
        fs::write(
            &paths.sources_config,
            serde_json::to_string(&sources).unwrap(),
        )
        .unwrap();
        fs::write(&paths.quizzes, quizzes.to_string()).unwrap();
        (dir, paths)
    }

    fn series_provider() -> FakeProvider {
        FakeProvider::default()
            .listing(
                "https://yt/series",
                &[
                    json!({"id": "v1", "title": "Intro", "playlist_title": "Series", "playlist_channel": "Channel", "playlist_uploader_id": "@channel"}),
                    json!({"id": "gone", "title": "Removed"}),
                    json!({"id": "broken", "title": "Broken"}),
                    json!({"title": "No id"}),
                    json!({"id": "v2", "title": "Part | Ep. 7", "duration": 61}),
                ],
            )
            .video(
                "v1",
                r#"{"title":"Intro","upload_date":"20260101","formats":[{"language":"fr","acodec":"opus"}]}"#,
                "251 webm audio only [fr]",
            )
            .video("broken", "{not json", "")
            .video(
                "v2",
                r#"{"subtitles":{"fr":[]}}"#,
                "140 m4a audio only [en]",
            )
    }

    #[tokio::test]
    async fn sync_catalog_writes_manifests_and_publishes() -> Result<()> {
        let (_dir, paths) = temp_content(
            &[
                source("series", "https://yt/series", true),
                source("disabled", "https://yt/disabled", false),
            ],
            json!({"v1": [{"id": "q1", "question": "?", "options": ["a", "b"], "correctIndex": 0}]}),
        );
        fs::write(&paths.cookies, "secret")?;

        let catalog = sync_catalog(
            Arc::new(series_provider()),
            &paths,
            &SyncOptions::default(),
            fixed_now(),
        )
        .await?;

        assert_eq!(catalog.updated_at, "2026-02-22T08:30:00.000Z");
        assert_eq!(catalog.playlists.len(), 1);
        let manifest = &catalog.playlists[0];
        assert_eq!(manifest.id, "series");
        assert_eq!(manifest.playlist_id, "PL-series");
        assert_eq!(manifest.playlist_title, "Series");
        assert_eq!(manifest.channel_name, "Channel");
        assert_eq!(manifest.channel_handle, "@channel");
        assert_eq!(manifest.updated_at, catalog.updated_at);

        let ids: Vec<_> = manifest.episodes.iter().map(|e| e.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
        let first = &manifest.episodes[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.french_availability, FrenchAvailability::Dub);
        assert_eq!(first.quiz.len(), 1);
        let second = &manifest.episodes[1];
        assert_eq!(second.position, 7);
        assert_eq!(second.title, "Part | Ep. 7");
        assert_eq!(second.duration_sec, 61.0);
        assert_eq!(second.published_at, "2026-02-22T08:30:00.000Z");
        assert_eq!(second.french_availability, FrenchAvailability::Captions);

        let written: PlaylistManifest =
            serde_json::from_str(&fs::read_to_string(paths.manifest_path("series"))?)?;
        assert_eq!(&written, manifest);
        let raw_catalog = fs::read_to_string(&paths.catalog)?;
        assert!(raw_catalog.ends_with("}\n"));
        let written_catalog: CatalogDocument = serde_json::from_str(&raw_catalog)?;
        assert_eq!(written_catalog, catalog);

        assert!(paths.public_root.join(CATALOG_FILE).exists());
        assert!(paths.public_root.join("playlists/series.json").exists());
        assert!(paths.public_root.join(QUIZZES_FILE).exists());
        assert!(!paths.public_root.join(COOKIES_FILE).exists());
        assert!(!paths.manifest_path("disabled").exists());
        Ok(())
    }

    #[tokio::test]
    async fn playlist_fields_fall_back_to_config() -> Result<()> {
        let provider = FakeProvider::default()
            .listing("https://yt/plain", &[json!({"id": "v1"})])
            .video("v1", "{}", "");
        let source: PlaylistSource =
            serde_json::from_value(source("plain", "https://yt/plain", true))?;
        let manifest = sync_playlist(
            Arc::new(provider),
            &source,
            &QuizStore::new(),
            "stamp",
            1,
            fixed_now(),
        )
        .await?
        .expect("manifest");
        assert_eq!(manifest.playlist_title, "plain");
        assert_eq!(manifest.channel_name, "Config Channel");
        assert_eq!(manifest.channel_handle, "@config");
        assert_eq!(manifest.episodes[0].title, "v1");
        Ok(())
    }

    #[tokio::test]
    async fn empty_listing_skips_playlist() -> Result<()> {
        let (_dir, paths) = temp_content(&[source("empty", "https://yt/empty", true)], json!({}));
        let provider = FakeProvider::default().raw_listing("https://yt/empty", "\n\n");
        let catalog =
            sync_catalog(Arc::new(provider), &paths, &SyncOptions::default(), fixed_now()).await?;
        assert!(catalog.playlists.is_empty());
        assert!(!paths.manifest_path("empty").exists());
        assert!(paths.catalog.exists());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_listing_aborts_sync() {
        let (_dir, paths) = temp_content(&[source("bad", "https://yt/bad", true)], json!({}));
        let provider = FakeProvider::default().raw_listing("https://yt/bad", "{\"id\":\"a\"}\noops");
        let err = sync_catalog(Arc::new(provider), &paths, &SyncOptions::default(), fixed_now())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("parsing listing for playlist bad"));
        assert!(!paths.catalog.exists());
    }

    #[tokio::test]
    async fn listing_fetch_failure_aborts_sync() {
        let (_dir, paths) = temp_content(&[source("gone", "https://yt/gone", true)], json!({}));
        let err = sync_catalog(
            Arc::new(FakeProvider::default()),
            &paths,
            &SyncOptions::default(),
            fixed_now(),
        )
        .await
        .unwrap_err();
        assert!(format!("{err:#}").contains("fetching listing for playlist gone"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_fetch_preserves_listing_order() -> Result<()> {
        let ids = ["a", "b", "c", "d"];
        let mut provider = FakeProvider::default().listing(
            "https://yt/fast",
            &ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
        );
        for (index, id) in ids.iter().enumerate() {
            provider = provider.video(id, "{}", "").delay(
                id,
                Duration::from_millis(40 * (ids.len() - index) as u64),
            );
        }
        let source: PlaylistSource =
            serde_json::from_value(source("fast", "https://yt/fast", true))?;
        let manifest = sync_playlist(
            Arc::new(provider),
            &source,
            &QuizStore::new(),
            "stamp",
            4,
            fixed_now(),
        )
        .await?
        .expect("manifest");
        let got: Vec<_> = manifest.episodes.iter().map(|e| e.video_id.as_str()).collect();
        assert_eq!(got, ids);
        let positions: Vec<_> = manifest.episodes.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        Ok(())
    }

    #[tokio::test]
    async fn blank_ids_are_never_fetched() -> Result<()> {
        let provider = Arc::new(
            FakeProvider::default()
                .listing(
                    "https://yt/blank",
                    &[json!({"id": "  "}), json!({"id": ""}), json!({"id": "v1"})],
                )
                .video("v1", "{}", ""),
        );
        let source: PlaylistSource =
            serde_json::from_value(source("blank", "https://yt/blank", true))?;
        let manifest = sync_playlist(
            provider.clone(),
            &source,
            &QuizStore::new(),
            "stamp",
            2,
            fixed_now(),
        )
        .await?
        .expect("manifest");
        assert_eq!(manifest.episodes.len(), 1);
        assert_eq!(manifest.episodes[0].video_id, "v1");
        assert_eq!(*provider.requested.lock().unwrap(), vec![watch_url("v1")]);
        Ok(())
    }

    #[tokio::test]
    async fn only_filter_limits_synced_playlists() -> Result<()> {
        let (_dir, paths) = temp_content(
            &[
                source("one", "https://yt/one", true),
                source("two", "https://yt/two", true),
            ],
            json!({}),
        );
        let provider = FakeProvider::default()
            .listing("https://yt/two", &[json!({"id": "v"})])
            .video("v", "{}", "");
        let options = SyncOptions {
            jobs: 2,
            only: vec!["two".into()],
        };
        let catalog = sync_catalog(Arc::new(provider), &paths, &options, fixed_now()).await?;
        assert_eq!(catalog.playlists.len(), 1);
        assert_eq!(catalog.playlists[0].id, "two");
        Ok(())
    }

    #[test]
    fn missing_config_files_use_defaults() -> Result<()> {
        let dir = tempdir()?;
        assert!(load_sources(&dir.path().join(PLAYLISTS_CONFIG_FILE))?.is_empty());
        assert!(load_quizzes(&dir.path().join(QUIZZES_FILE))?.is_empty());
        Ok(())
    }

    #[test]
    fn invalid_config_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(PLAYLISTS_CONFIG_FILE);
        fs::write(&path, "[{")?;
        assert!(load_sources(&path).is_err());
        Ok(())
    }

    #[test]
    fn select_sources_keeps_config_order() {
        let sources: Vec<PlaylistSource> = [
            source("b", "u1", true),
            source("a", "u2", true),
            source("c", "u3", false),
        ]
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap())
        .collect();
        let ids: Vec<_> = select_sources(&sources, &[])
            .into_iter()
            .map(|source| source.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(select_sources(&sources, &["c".to_string()]).is_empty());
    }

    #[test]
    fn publish_content_overwrites_existing_files() -> Result<()> {
        let dir = tempdir()?;
        let content = dir.path().join("content");
        let public = dir.path().join("public");
        fs::create_dir_all(content.join("playlists"))?;
        fs::create_dir_all(&public)?;
        fs::write(content.join("catalog.json"), "new")?;
        fs::write(content.join("playlists/a.json"), "a")?;
        fs::write(public.join("catalog.json"), "old")?;

        let copied = publish_content(&content, &public)?;
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(public.join("catalog.json"))?, "new");
        assert_eq!(fs::read_to_string(public.join("playlists/a.json"))?, "a");
        Ok(())
    }

    #[test]
    fn publish_content_skips_nested_public_root() -> Result<()> {
        let dir = tempdir()?;
        let content = dir.path().join("content");
        let public = content.join("public");
        fs::create_dir_all(&content)?;
        fs::write(content.join("catalog.json"), "{}")?;

        publish_content(&content, &public)?;
        assert!(public.join("catalog.json").exists());
        assert!(!public.join("public").exists());
        Ok(())
    }
}

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_CONTENT_ROOT: &str = "content";
pub const DEFAULT_PUBLIC_ROOT: &str = "public/content";
pub const DEFAULT_YT_DLP_BIN: &str = "yt-dlp";
pub const DEFAULT_SYNC_JOBS: usize = 1;

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    /// Holds `playlists.config.json`, `quizzes.json` and the generated
    /// manifests.
    pub content_root: PathBuf,
    /// Copy of `content_root` served by the web app.
    pub public_root: PathBuf,
    pub ytdlp_bin: PathBuf,
    pub jobs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub content_root: Option<PathBuf>,
    pub public_root: Option<PathBuf>,
    pub ytdlp_bin: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_paths(overrides: RuntimeOverrides) -> Result<RuntimePaths> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    Ok(build_runtime_paths_with_overrides(
        &file_vars,
        env_var_string,
        overrides,
    ))
}

#[cfg(test)]
fn build_runtime_paths(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> RuntimePaths {
    build_runtime_paths_with_overrides(file_vars, env_lookup, RuntimeOverrides::default())
}

fn build_runtime_paths_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> RuntimePaths {
    let content_root = overrides
        .content_root
        .or_else(|| lookup_value("CONTENT_ROOT", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_ROOT));
    let public_root = overrides
        .public_root
        .or_else(|| lookup_value("PUBLIC_ROOT", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_ROOT));
    let ytdlp_bin = overrides
        .ytdlp_bin
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| lookup_value("YT_DLP_BIN", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YT_DLP_BIN));
    let jobs = overrides
        .jobs
        .filter(|jobs| *jobs > 0)
        .or_else(|| {
            lookup_value("SYNC_JOBS", file_vars, &env_lookup)
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|jobs| *jobs > 0)
        })
        .unwrap_or(DEFAULT_SYNC_JOBS);
    RuntimePaths {
        content_root,
        public_root,
        ytdlp_bin,
        jobs,
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

#![forbid(unsafe_code)]

//! Pure field extractors over raw yt-dlp payloads.
//!
//! None of these fail: missing or unusable input resolves to an empty set,
//! `None`, or a defined fallback value.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::records::{Loose, RawDetailMetadata, Thumbnail};

/// Matches `[fr]`, `[en-US]` annotations in `yt-dlp -F` output.
fn language_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([a-z]{2}(?:-[A-Z]{2})?)\]").expect("language tag pattern is valid")
    })
}

/// ASCII digits and ASCII word boundaries only, so Arabic-Indic digits are
/// skipped and non-Latin letters right after the number still end a word.
fn episode_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?-u:\b)(?:ep|episode)\.?\s*([0-9]{1,3})(?-u:\b)")
            .expect("episode pattern is valid")
    })
}

/// Trims and lowercases a language code; blank codes are dropped.
pub fn normalize_lang_code(value: &str) -> Option<String> {
    let cleaned = value.trim().to_lowercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Converts yt-dlp's `YYYYMMDD` into `YYYY-MM-DDT00:00:00.000Z`. The digits
/// are not validated. Anything that is not exactly eight characters falls
/// back to the current instant.
pub fn normalize_upload_date(upload_date: Option<&str>) -> String {
    normalize_upload_date_at(upload_date, Utc::now())
}

pub fn normalize_upload_date_at(upload_date: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(value) = upload_date else {
        return format_instant(now);
    };
    let chars: Vec<char> = value.chars().collect();
    if chars.len() != 8 {
        return format_instant(now);
    }
    let year: String = chars[0..4].iter().collect();
    let month: String = chars[4..6].iter().collect();
    let day: String = chars[6..8].iter().collect();
    format!("{year}-{month}-{day}T00:00:00.000Z")
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Finds `Ep. 3`, `episode 12`, `EP7` style markers. Zero is rejected so
/// callers fall back to the playlist position.
pub fn parse_episode_number(title: Option<&str>) -> Option<u32> {
    let title = title?;
    let captures = episode_number_regex().captures(title)?;
    let parsed: u32 = captures.get(1)?.as_str().parse().ok()?;
    (parsed > 0).then_some(parsed)
}

/// Collects bracketed language tags from a format table, sorted and unique.
pub fn extract_language_tags_from_format_text(format_text: &str) -> Vec<String> {
    let mut langs = BTreeSet::new();
    for line in format_text.lines() {
        for captures in language_tag_regex().captures_iter(line) {
            if let Some(code) = captures.get(1).and_then(|m| normalize_lang_code(m.as_str())) {
                langs.insert(code);
            }
        }
    }
    langs.into_iter().collect()
}

/// Languages of formats that actually carry an audio stream.
pub fn extract_audio_langs(detail: &RawDetailMetadata) -> Vec<String> {
    let mut langs = BTreeSet::new();
    for format in detail.formats() {
        let Some(language) = format.language.as_str().and_then(normalize_lang_code) else {
            continue;
        };
        let has_audio = format
            .acodec
            .as_str()
            .is_some_and(|codec| !codec.is_empty() && codec != "none");
        if has_audio {
            langs.insert(language);
        }
    }
    langs.into_iter().collect()
}

/// Manual subtitles and automatic captions merged into one language set.
pub fn extract_caption_langs(detail: &RawDetailMetadata) -> Vec<String> {
    detail
        .subtitle_keys()
        .chain(detail.automatic_caption_keys())
        .filter_map(normalize_lang_code)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn thumbnail_area(slot: &Loose<Thumbnail>) -> f64 {
    match slot.valid() {
        Some(thumbnail) => thumbnail.width.to_number() * thumbnail.height.to_number(),
        None => 0.0,
    }
}

/// Picks the largest thumbnail by pixel area; the first one wins on ties.
pub fn pick_best_thumbnail(detail: &RawDetailMetadata, fallback: &str) -> String {
    let mut best: Option<(&Loose<Thumbnail>, f64)> = None;
    for slot in detail.thumbnail_slots() {
        let area = thumbnail_area(slot);
        if best.is_none_or(|(_, best_area)| area > best_area) {
            best = Some((slot, area));
        }
    }

    best.and_then(|(slot, _)| slot.valid())
        .and_then(|thumbnail| thumbnail.url.as_str())
        .unwrap_or(fallback)
        .to_owned()
}

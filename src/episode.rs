#![forbid(unsafe_code)]

//! Canonical episode records and the builder that derives them from a flat
//! listing entry, the per-video `-J` payload and the `-F` format table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::extract::{
    extract_audio_langs, extract_caption_langs, extract_language_tags_from_format_text,
    normalize_upload_date_at, parse_episode_number, pick_best_thumbnail,
};
use crate::records::{RawDetailMetadata, RawListingEntry};

const FRENCH: &str = "fr";

/// How French is offered for an episode, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrenchAvailability {
    Dub,
    Captions,
    None,
}

/// Dub evidence from either audio signal wins over captions.
pub fn classify_french_availability(
    audio_langs: &[String],
    caption_langs: &[String],
    format_langs: &[String],
) -> FrenchAvailability {
    let has_french = |langs: &[String]| langs.iter().any(|lang| lang == FRENCH);
    if has_french(audio_langs) || has_french(format_langs) {
        FrenchAvailability::Dub
    } else if has_french(caption_langs) {
        FrenchAvailability::Captions
    } else {
        FrenchAvailability::None
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Normalized episode as stored in playlist manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltEpisode {
    pub video_id: String,
    pub title: String,
    pub position: u32,
    pub url: String,
    pub thumbnail_url: String,
    #[serde(serialize_with = "serialize_count")]
    pub duration_sec: f64,
    pub published_at: String,
    #[serde(serialize_with = "serialize_count")]
    pub view_count: f64,
    pub audio_langs: Vec<String>,
    pub caption_langs: Vec<String>,
    pub has_french_dub: bool,
    pub french_availability: FrenchAvailability,
    #[serde(default)]
    pub quiz: Vec<Value>,
}

/// Whole numbers are written as JSON integers so manifests read `300`, not
/// `300.0`.
fn serialize_count<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64 {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Everything the builder needs for one (playlist, video) pair.
#[derive(Debug, Clone)]
pub struct EpisodeInput<'a> {
    pub entry: &'a RawListingEntry,
    pub detail: &'a RawDetailMetadata,
    /// 1-based position in the listing, used when the title has no number.
    pub position_fallback: u32,
    pub format_text: &'a str,
    pub quiz: Vec<Value>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

pub fn build_episode(input: EpisodeInput<'_>) -> CoreResult<BuiltEpisode> {
    build_episode_at(input, Utc::now())
}

/// Same as [`build_episode`] with an explicit clock for the date fallback.
pub fn build_episode_at(input: EpisodeInput<'_>, now: DateTime<Utc>) -> CoreResult<BuiltEpisode> {
    let EpisodeInput {
        entry,
        detail,
        position_fallback,
        format_text,
        quiz,
    } = input;

    let video_id = match entry.id.as_str() {
        Some(id) if !id.trim().is_empty() => id.to_owned(),
        Some(_) => return Err(CoreError::InvalidEntry("empty video id".into())),
        None => return Err(CoreError::InvalidEntry("missing video id".into())),
    };

    let title = non_blank(detail.title.as_str())
        .or_else(|| non_blank(entry.title.as_str()))
        .unwrap_or(video_id.as_str())
        .to_owned();

    let position = parse_episode_number(Some(&title))
        .or_else(|| parse_episode_number(entry.title.as_str()))
        .unwrap_or(position_fallback);

    let format_langs = extract_language_tags_from_format_text(format_text);
    let mut audio_langs = extract_audio_langs(detail);
    if format_langs.iter().any(|lang| lang == FRENCH)
        && let Err(slot) = audio_langs.binary_search_by(|lang| lang.as_str().cmp(FRENCH))
    {
        audio_langs.insert(slot, FRENCH.to_owned());
    }
    let caption_langs = extract_caption_langs(detail);
    let french_availability =
        classify_french_availability(&audio_langs, &caption_langs, &format_langs);

    let thumbnail_fallback = entry.thumbnail.as_str().unwrap_or_default();

    Ok(BuiltEpisode {
        url: watch_url(&video_id),
        thumbnail_url: pick_best_thumbnail(detail, thumbnail_fallback),
        duration_sec: detail.duration.or(&entry.duration).to_number(),
        published_at: normalize_upload_date_at(detail.upload_date.as_str(), now),
        view_count: detail.view_count.or(&entry.view_count).to_number(),
        has_french_dub: french_availability == FrenchAvailability::Dub,
        french_availability,
        audio_langs,
        caption_langs,
        video_id,
        title,
        position,
        quiz,
    })
}

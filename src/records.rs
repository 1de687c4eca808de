#![forbid(unsafe_code)]

//! Raw yt-dlp payloads as they come off the wire.
//!
//! yt-dlp output is loosely typed: fields go missing on older videos, some
//! extractors emit numbers as strings, and a few emit `null`. Every field here
//! is wrapped in [`Loose`] so callers have to decide explicitly what an absent
//! or malformed value means instead of relying on implicit coercion.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// A single field of provider JSON.
///
/// `null` and a missing key both map to `Absent`. A value that is present but
/// does not have the expected shape is kept verbatim in `Malformed`.
#[derive(Debug, Clone, PartialEq)]
pub enum Loose<T> {
    Absent,
    Valid(T),
    Malformed(Value),
}

impl<T> Default for Loose<T> {
    fn default() -> Self {
        Loose::Absent
    }
}

impl<T: DeserializeOwned> Loose<T> {
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            return Loose::Absent;
        }
        match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) => Loose::Valid(parsed),
            Err(_) => Loose::Malformed(value),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Loose<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

impl<T> Loose<T> {
    pub fn is_present(&self) -> bool {
        !matches!(self, Loose::Absent)
    }

    pub fn valid(&self) -> Option<&T> {
        match self {
            Loose::Valid(value) => Some(value),
            _ => None,
        }
    }

    /// Falls through to `other` only when this field is absent. A malformed
    /// value still wins, matching how the first source that reports a field
    /// is the one that gets used.
    pub fn or<'a>(&'a self, other: &'a Loose<T>) -> &'a Loose<T> {
        if self.is_present() { self } else { other }
    }
}

impl Loose<String> {
    pub fn as_str(&self) -> Option<&str> {
        self.valid().map(String::as_str)
    }
}

impl Loose<f64> {
    /// Total numeric coercion: numbers pass through, numeric strings are
    /// parsed, booleans become 1/0 and anything else is 0. Negative and
    /// non-finite results collapse to 0.
    pub fn to_number(&self) -> f64 {
        let number = match self {
            Loose::Absent => 0.0,
            Loose::Valid(value) => *value,
            Loose::Malformed(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(0.0)
                }
            }
            Loose::Malformed(Value::Bool(flag)) => {
                if *flag {
                    1.0
                } else {
                    0.0
                }
            }
            Loose::Malformed(_) => 0.0,
        };
        if number.is_finite() && number > 0.0 {
            number
        } else {
            0.0
        }
    }
}

/// One line of `yt-dlp --flat-playlist --dump-json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawListingEntry {
    pub id: Loose<String>,
    pub title: Loose<String>,
    pub duration: Loose<f64>,
    pub view_count: Loose<f64>,
    pub thumbnail: Loose<String>,
    pub playlist_title: Loose<String>,
    pub playlist_channel: Loose<String>,
    pub playlist_uploader_id: Loose<String>,
}

impl RawListingEntry {
    /// Builds an entry from an already parsed record. Records that are not
    /// JSON objects yield an entry with every field absent.
    pub fn from_record(record: Value) -> Self {
        serde_json::from_value(record).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: Loose<String>,
    pub width: Loose<f64>,
    pub height: Loose<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Format {
    pub language: Loose<String>,
    pub acodec: Loose<String>,
}

/// Subset of `yt-dlp -J` used to build an episode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDetailMetadata {
    pub title: Loose<String>,
    pub duration: Loose<f64>,
    pub upload_date: Loose<String>,
    pub view_count: Loose<f64>,
    pub thumbnails: Loose<Vec<Loose<Thumbnail>>>,
    pub formats: Loose<Vec<Loose<Format>>>,
    pub subtitles: Loose<BTreeMap<String, Value>>,
    pub automatic_captions: Loose<BTreeMap<String, Value>>,
}

impl RawDetailMetadata {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Thumbnail slots in provider order. Malformed slots are kept so that
    /// tie-breaking by position still sees them.
    pub fn thumbnail_slots(&self) -> &[Loose<Thumbnail>] {
        self.thumbnails.valid().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn formats(&self) -> impl Iterator<Item = &Format> {
        self.formats
            .valid()
            .into_iter()
            .flatten()
            .filter_map(Loose::valid)
    }

    pub fn subtitle_keys(&self) -> impl Iterator<Item = &str> {
        self.subtitles
            .valid()
            .into_iter()
            .flat_map(|tracks| tracks.keys().map(String::as_str))
    }

    pub fn automatic_caption_keys(&self) -> impl Iterator<Item = &str> {
        self.automatic_captions
            .valid()
            .into_iter()
            .flat_map(|tracks| tracks.keys().map(String::as_str))
    }
}

/// Parses newline-delimited JSON. Blank lines are skipped; the first line
/// that fails to parse aborts the whole batch. Byte-order marks count as
/// whitespace.
pub fn parse_ndjson(raw: &str) -> CoreResult<Vec<Value>> {
    let mut records = Vec::new();
    for (index, line) in raw.split('\n').enumerate() {
        let trimmed = line.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str::<Value>(trimmed).map_err(|source| {
            CoreError::MalformedRecord {
                line: index + 1,
                source,
            }
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Convenience wrapper for flat playlist dumps.
pub fn parse_listing(raw: &str) -> CoreResult<Vec<RawListingEntry>> {
    Ok(parse_ndjson(raw)?
        .into_iter()
        .map(RawListingEntry::from_record)
        .collect())
}

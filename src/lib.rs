#![forbid(unsafe_code)]

//! Building blocks for the playlist catalog sync: raw yt-dlp record parsing,
//! per-field metadata extraction, episode normalization and the catalog
//! assembler that writes the JSON manifests served to the web app.

pub mod catalog;
pub mod config;
pub mod episode;
pub mod error;
pub mod extract;
pub mod provider;
pub mod records;

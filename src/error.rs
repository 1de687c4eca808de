#![forbid(unsafe_code)]

use thiserror::Error;

/// Structural failures raised by the normalization core. Everything else
/// (missing dates, thumbnails, languages, counters) degrades to defaults.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("line {line} is not a valid JSON record: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid listing entry: {0}")]
    InvalidEntry(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

//! Error types shared across the crate.
//!
//! Library modules return the typed [`Error`] so callers can react to
//! specific outcomes (a rejected session triggers a re-bootstrap, a capture
//! timeout does not). The CLI layer wraps these in `anyhow` with context.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("browser operation failed: {0}")]
    Browser(String),

    #[error("no x-search-session observed within {waited_secs}s")]
    CaptureTimeout { waited_secs: u64 },

    #[error("the search API rejected the x-search-session (status {status})")]
    SessionRejected { status: u16 },

    #[error("search API returned status {status} on page {page}: {snippet}")]
    ApiStatus {
        status: u16,
        page: u32,
        snippet: String,
    },

    #[error("could not decode search API response on page {page}: {snippet}")]
    ApiDecode { page: u32, snippet: String },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

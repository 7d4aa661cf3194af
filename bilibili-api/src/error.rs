//! Error types for the Bilibili API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Bilibili API.
#[derive(Debug, Error)]
pub enum BiliError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx HTTP status.
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The API returned a nonzero `code` in its JSON response body.
    ///
    /// Common codes:
    /// - `-352` — risk control rejected the request (stale WBI keys or cookies)
    /// - `-400` — malformed request parameters
    /// - `-404` — resource not found
    #[error("API error (code {code}): {message}")]
    Api {
        /// Bilibili application status code (not HTTP status).
        code: i64,
        /// Human-readable error message from the API.
        message: String,
    },

    /// The play-URL response listed no DASH audio variants.
    #[error("no audio stream available")]
    NoAudio,

    /// WBI key material is missing or malformed.
    #[error("invalid WBI key: {0}")]
    InvalidKey(String),

    /// File I/O error (session store read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON response or session document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors (e.g. missing config directory).
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for `Result<T, BiliError>`.
pub type Result<T> = std::result::Result<T, BiliError>;

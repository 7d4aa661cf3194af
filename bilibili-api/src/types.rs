//! Data types for Bilibili API responses.
//!
//! These are projections of the raw JSON returned by the web endpoints.
//! Favorites payloads are not projected; they are passed through as
//! [`serde_json::Value`].

use serde::{Deserialize, Serialize};

/// One video hit from a search.
///
/// Returned by [`BiliClient::search`](crate::BiliClient::search).
///
/// API JSON path: `response.data.result[]` with fields `title` (contains
/// `<em class="keyword">` highlight markup, stripped here), `bvid`,
/// `author`, `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Video title with highlight markup removed.
    pub title: String,
    /// Video identifier, e.g. `BV1GJ411x7h7`.
    pub bvid: String,
    /// Uploader name.
    pub author: String,
    pub description: String,
}

/// One sub-part (P) of a video.
///
/// Returned by [`BiliClient::pages`](crate::BiliClient::pages).
///
/// API JSON path: `response.data[]` with fields `cid`, `page`, `part`,
/// `duration` (seconds), `first_frame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Content identifier, needed by [`BiliClient::audio_link`](crate::BiliClient::audio_link).
    pub cid: u64,
    /// 1-based page index.
    pub page: u32,
    /// Part title.
    pub part: String,
    /// Duration in seconds.
    pub duration: u64,
    /// Cover frame URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_frame: Option<String>,
}

/// One DASH audio variant of a video part.
///
/// API JSON path: `response.data.dash.audio[]` with fields `id` (quality
/// code, e.g. 30280 = 192K), `bandwidth` (bits/s), `baseUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStream {
    pub id: u64,
    pub bandwidth: u64,
    /// Direct CDN URL; requires the `Referer` header to download.
    pub base_url: String,
}

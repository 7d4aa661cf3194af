//! Search API.
//!
//! Endpoint: `GET /x/web-interface/wbi/search/type` (WBI-signed)
//!
//! Request parameters:
//! - `search_type` — always `video`
//! - `keyword` — search keyword
//! - `page` — 1-based page number (20 hits per page)
//!
//! Response JSON:
//! ```json
//! {
//!   "code": 0,
//!   "data": {
//!     "numResults": 1000,
//!     "result": [
//!       {
//!         "title": "【4K】<em class=\"keyword\">Bad Apple</em>!!",
//!         "bvid": "BV1xx411c7mD",
//!         "author": "...",
//!         "description": "..."
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! `data.result` is absent when nothing matches.

use crate::client::{BiliClient, Signing, or_neutral};
use crate::error::Result;
use crate::types::SearchResult;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

static HIGHLIGHT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?em[^>]*>").expect("valid tag pattern"));

impl BiliClient {
    /// Search videos by title, first page.
    ///
    /// Returns an empty list on any failure (logged).
    pub fn search(&mut self, title: &str) -> Vec<SearchResult> {
        self.search_page(title, 1)
    }

    /// Search videos by title on the given 1-based page.
    pub fn search_page(&mut self, title: &str, page: u32) -> Vec<SearchResult> {
        let result = self.try_search(title, page);
        or_neutral("search", result)
    }

    /// Like [`search_page`](Self::search_page), but reports why it failed.
    pub fn try_search(&mut self, title: &str, page: u32) -> Result<Vec<SearchResult>> {
        let params = json!({
            "search_type": "video",
            "keyword": title,
            "page": page,
        });
        let resp = self.get_json("/x/web-interface/wbi/search/type", &params, Signing::Wbi)?;
        Ok(parse_results(resp["data"]["result"].as_array()))
    }
}

fn parse_results(arr: Option<&Vec<Value>>) -> Vec<SearchResult> {
    let Some(arr) = arr else { return vec![] };
    arr.iter()
        .map(|v| SearchResult {
            title: strip_highlight(v["title"].as_str().unwrap_or("")),
            bvid: v["bvid"].as_str().unwrap_or("").to_owned(),
            author: v["author"].as_str().unwrap_or("").to_owned(),
            description: v["description"].as_str().unwrap_or("").to_owned(),
        })
        .collect()
}

/// Remove the `<em class="keyword">…</em>` highlight markup from a title.
fn strip_highlight(title: &str) -> String {
    HIGHLIGHT_TAG.replace_all(title, "").into_owned()
}

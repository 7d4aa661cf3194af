//! Video page list and audio stream APIs.
//!
//! # Endpoints
//!
//! ## `pages` — `GET /x/player/pagelist`
//!
//! Request: `?bvid=BV1xx411c7mD` (unsigned)
//!
//! Response:
//! ```json
//! {
//!   "code": 0,
//!   "data": [
//!     { "cid": 3724723, "page": 1, "part": "P1", "duration": 219,
//!       "first_frame": "http://i0.hdslb.com/bfs/storyff/..." }
//!   ]
//! }
//! ```
//!
//! ## `audio_link` — `GET /x/player/wbi/playurl` (WBI-signed)
//!
//! Request: `bvid`, `cid`, `fnval=16` (DASH), `qn=64`
//!
//! Response:
//! ```json
//! {
//!   "code": 0,
//!   "data": {
//!     "dash": {
//!       "audio": [
//!         { "id": 30280, "bandwidth": 319173, "baseUrl": "https://upos-sz-mirror..." },
//!         { "id": 30216, "bandwidth": 67125,  "baseUrl": "https://upos-sz-mirror..." }
//!       ]
//!     }
//!   }
//! }
//! ```

use crate::client::{BiliClient, Signing, or_neutral};
use crate::error::{BiliError, Result};
use crate::types::{AudioStream, PageInfo};
use serde_json::{Value, json};

impl BiliClient {
    /// List every sub-part of a video, in server order.
    ///
    /// Returns an empty list on any failure (logged).
    pub fn pages(&mut self, bvid: &str) -> Vec<PageInfo> {
        let result = self.try_pages(bvid);
        or_neutral("pages", result)
    }

    /// Like [`pages`](Self::pages), but reports why it failed.
    pub fn try_pages(&mut self, bvid: &str) -> Result<Vec<PageInfo>> {
        let params = json!({ "bvid": bvid });
        let resp = self.get_json("/x/player/pagelist", &params, Signing::Plain)?;
        Ok(resp["data"]
            .as_array()
            .map(|arr| arr.iter().map(parse_page).collect())
            .unwrap_or_default())
    }

    /// Direct URL of the highest-bandwidth audio stream of one video part.
    ///
    /// Returns an empty string on any failure (logged), including a response
    /// with no audio variants.
    pub fn audio_link(&mut self, bvid: &str, cid: u64) -> String {
        let result = self.try_audio_link(bvid, cid);
        or_neutral("audio_link", result)
    }

    /// Like [`audio_link`](Self::audio_link), but reports why it failed.
    pub fn try_audio_link(&mut self, bvid: &str, cid: u64) -> Result<String> {
        let best = self
            .try_audio_streams(bvid, cid)?
            .into_iter()
            .next()
            .ok_or(BiliError::NoAudio)?;
        Ok(best.base_url)
    }

    /// Every DASH audio variant, highest bandwidth first.
    ///
    /// Variants with equal bandwidth keep their server order.
    pub fn try_audio_streams(&mut self, bvid: &str, cid: u64) -> Result<Vec<AudioStream>> {
        let params = json!({
            "bvid": bvid,
            "cid": cid,
            "fnval": 16,
            "qn": 64,
        });
        let resp = self.get_json("/x/player/wbi/playurl", &params, Signing::Wbi)?;
        Ok(rank_streams(resp["data"]["dash"]["audio"].as_array()))
    }
}

fn parse_page(v: &Value) -> PageInfo {
    PageInfo {
        cid: v["cid"].as_u64().unwrap_or(0),
        page: v["page"]
            .as_u64()
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        part: v["part"].as_str().unwrap_or("").to_owned(),
        duration: v["duration"].as_u64().unwrap_or(0),
        first_frame: v["first_frame"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from),
    }
}

fn rank_streams(arr: Option<&Vec<Value>>) -> Vec<AudioStream> {
    let Some(arr) = arr else { return vec![] };
    let mut streams: Vec<AudioStream> = arr
        .iter()
        .map(|v| AudioStream {
            id: v["id"].as_u64().unwrap_or(0),
            bandwidth: v["bandwidth"].as_u64().unwrap_or(0),
            base_url: v["baseUrl"]
                .as_str()
                .or_else(|| v["base_url"].as_str())
                .unwrap_or("")
                .to_owned(),
        })
        .collect();
    // stable: ties keep server order
    streams.sort_by(|a, b| b.bandwidth.cmp(&a.bandwidth));
    streams
}

//! Favorites (收藏夹) APIs.
//!
//! Both endpoints are WBI-signed and their `data` payloads are returned
//! unmodified.
//!
//! ## `favorites_page` — `GET /x/v3/fav/resource/list`
//!
//! Request: `media_id` (folder id), `pn` (1-based page), `ps` (page size, max 20)
//!
//! `data` holds `info` (folder metadata), `medias[]` (items with `bvid`,
//! `title`, `upper`, `duration`, ...) and `has_more`.
//!
//! ## `user_favorites_folders` — `GET /x/v3/fav/folder/created/list-all`
//!
//! Request: `up_mid` (user id)
//!
//! `data` holds `count` and `list[]` (folders with `id`, `title`,
//! `media_count`). Private folders are only listed for their owner's cookies.

use crate::client::{BiliClient, Signing, or_neutral};
use crate::error::{BiliError, Result};
use serde_json::{Value, json};

impl BiliClient {
    /// One page of a favorites folder's items, as the upstream `data` object.
    ///
    /// Returns `None` on any failure (logged).
    pub fn favorites_page(&mut self, folder_id: u64, page: u32, page_size: u32) -> Option<Value> {
        let result = self.try_favorites_page(folder_id, page, page_size).map(Some);
        or_neutral("favorites_page", result)
    }

    /// Like [`favorites_page`](Self::favorites_page), but reports why it failed.
    pub fn try_favorites_page(&mut self, folder_id: u64, page: u32, page_size: u32) -> Result<Value> {
        let params = json!({
            "media_id": folder_id,
            "ps": page_size,
            "pn": page,
        });
        let resp = self.get_json("/x/v3/fav/resource/list", &params, Signing::Wbi)?;
        take_data(resp)
    }

    /// Every favorites folder created by a user, as the upstream `data` object.
    ///
    /// Returns `None` on any failure (logged).
    pub fn user_favorites_folders(&mut self, user_id: u64) -> Option<Value> {
        let result = self.try_user_favorites_folders(user_id).map(Some);
        or_neutral("user_favorites_folders", result)
    }

    /// Like [`user_favorites_folders`](Self::user_favorites_folders), but reports why it failed.
    pub fn try_user_favorites_folders(&mut self, user_id: u64) -> Result<Value> {
        let params = json!({ "up_mid": user_id });
        let resp = self.get_json("/x/v3/fav/folder/created/list-all", &params, Signing::Wbi)?;
        take_data(resp)
    }
}

/// Move `data` out of a success envelope; a missing or `null` payload is an error.
fn take_data(mut resp: Value) -> Result<Value> {
    match resp.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(BiliError::Other("response has no data".into())),
    }
}

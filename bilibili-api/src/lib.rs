//! Bilibili web API client library.
//!
//! Provides cookie-authenticated, WBI-signed access to the Bilibili web API:
//! video search, video page lists, audio stream URLs, and favorites folders.
//!
//! # Session
//!
//! Cookies, request headers, and the two rotating WBI keys are persisted to
//! `~/.config/bilibili-api/userinfo.json`. A missing or stale session is
//! healed on construction: the homepage is visited for cookies and the nav
//! endpoint for keys. Keys older than a day are refreshed again before any
//! signed request.
//!
//! ```no_run
//! use bilibili_api::BiliClient;
//!
//! let mut client = BiliClient::new().unwrap();
//! for hit in client.search("bad apple") {
//!     println!("{} {}", hit.bvid, hit.title);
//! }
//! ```
//!
//! # API endpoint mapping
//!
//! | Method                                  | Endpoint                              | Signed |
//! |-----------------------------------------|---------------------------------------|--------|
//! | [`BiliClient::search`]                  | `/x/web-interface/wbi/search/type`    | WBI    |
//! | [`BiliClient::pages`]                   | `/x/player/pagelist`                  | no     |
//! | [`BiliClient::audio_link`]              | `/x/player/wbi/playurl`               | WBI    |
//! | [`BiliClient::favorites_page`]          | `/x/v3/fav/resource/list`             | WBI    |
//! | [`BiliClient::user_favorites_folders`]  | `/x/v3/fav/folder/created/list-all`   | WBI    |
//! | [`BiliClient::refresh_wbi_keys`]        | `/x/web-interface/nav`                | no     |
//!
//! # Errors
//!
//! The operations above never fail: transport errors, non-2xx statuses,
//! nonzero API codes, and empty payloads are logged through [`log`] and
//! collapse to an empty list, empty string, or `None`. Each has a `try_`
//! twin returning [`Result`] for callers that need the cause.
//!
//! # Signing
//!
//! See [`wbi`] for the mixin-key permutation and `w_rid` digest.

pub mod auth;
pub mod client;
pub mod error;
mod favorites;
mod search;
pub mod store;
#[cfg(test)]
mod testing;
pub mod transport;
pub mod types;
mod video;
pub mod wbi;

pub use client::BiliClient;
pub use error::{BiliError, Result};

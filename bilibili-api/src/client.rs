//! HTTP client for the Bilibili web API.
//!
//! Construction loads the persisted [`Session`] and heals it:
//!
//! 1. No cookies → GET `https://www.bilibili.com` and keep its `Set-Cookie`s
//!    (a non-2xx answer is logged, not fatal)
//! 2. WBI keys empty or older than a day → GET `/x/web-interface/nav` and take
//!    the file stems of `data.wbi_img.img_url` / `sub_url`
//!
//! Every request then follows the same path: sign if the endpoint needs it,
//! GET, reject non-2xx, merge new cookies, parse JSON, reject nonzero `code`.
//!
//! # Response format
//!
//! All API responses share this envelope:
//!
//! ```json
//! {
//!   "code": 0,
//!   "message": "0",
//!   "data": { ...endpoint-specific payload... }
//! }
//! ```
//!
//! Nonzero codes are mapped to [`BiliError::Api`](crate::BiliError::Api).

use crate::auth::Session;
use crate::error::{BiliError, Result};
use crate::store::{JsonFileStore, SessionStore};
use crate::transport::{HttpTransport, Transport};
use crate::wbi;
use serde_json::{Value, json};

const API_BASE: &str = "https://api.bilibili.com";
const HOME_URL: &str = "https://www.bilibili.com";
const NAV_PATH: &str = "/x/web-interface/nav";

/// Whether an endpoint expects a WBI signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signing {
    Wbi,
    Plain,
}

/// Blocking client for the Bilibili web API.
///
/// Owns the [`Session`], the [`SessionStore`] it is persisted to, and the
/// [`Transport`] requests go through. API methods are implemented in
/// separate modules (`search`, `video`, `favorites`) as `impl BiliClient`
/// blocks.
pub struct BiliClient {
    transport: Box<dyn Transport>,
    store: Box<dyn SessionStore>,
    session: Session,
}

impl BiliClient {
    /// Create a client backed by `~/.config/bilibili-api/userinfo.json`.
    pub fn new() -> Result<Self> {
        Self::with_store(JsonFileStore::open_default()?)
    }

    /// Create a client over an explicit store, using the default HTTP transport.
    pub fn with_store(store: impl SessionStore + 'static) -> Result<Self> {
        Self::with_parts(store, HttpTransport::new()?)
    }

    /// Create a client from an explicit store and transport.
    ///
    /// Bootstraps cookies and WBI keys if the stored session lacks them.
    pub fn with_parts(
        store: impl SessionStore + 'static,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        let doc = store.load()?;
        let fresh = !doc.contains_key("header");
        let session = Session::from_document(doc)?;

        let mut client = Self {
            transport: Box::new(transport),
            store: Box::new(store),
            session,
        };
        if fresh {
            client.persist(json!({ "header": client.session.header }))?;
        }
        client.ensure_cookies()?;
        client.ensure_wbi_keys()?;
        Ok(client)
    }

    /// Return a reference to the current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch fresh WBI keys from `/x/web-interface/nav` and persist them.
    ///
    /// The nav endpoint answers `code: -101` for anonymous sessions but still
    /// includes `wbi_img`, so only the HTTP status is checked.
    pub fn refresh_wbi_keys(&mut self) -> Result<()> {
        let url = format!("{API_BASE}{NAV_PATH}");
        let resp = self.transport.get(&url, &self.request_headers())?;
        if !resp.is_success() {
            return Err(BiliError::Status {
                status: resp.status,
            });
        }
        self.absorb_cookies(&resp.set_cookies)?;

        let json = resp.json()?;
        let wbi_img = &json["data"]["wbi_img"];
        let img_url = wbi_img["img_url"]
            .as_str()
            .ok_or_else(|| BiliError::InvalidKey("nav response has no img_url".into()))?;
        let sub_url = wbi_img["sub_url"]
            .as_str()
            .ok_or_else(|| BiliError::InvalidKey("nav response has no sub_url".into()))?;

        self.session.img_key = wbi::key_from_url(img_url)?;
        self.session.sub_key = wbi::key_from_url(sub_url)?;
        self.session.last_update = chrono::Utc::now().timestamp();
        log::info!("refreshed WBI keys");

        self.persist(json!({
            "img_key": self.session.img_key,
            "sub_key": self.session.sub_key,
            "last_update": self.session.last_update,
        }))
    }

    /// Set (or replace) a static request header.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.session
            .header
            .insert(name.to_owned(), value.to_owned());
        self.persist(json!({ "header": self.session.header }))
    }

    /// Remove a static request header. Returns whether it was present.
    pub fn remove_header(&mut self, name: &str) -> Result<bool> {
        let removed = self.session.header.remove(name).is_some();
        if removed {
            self.persist(json!({ "header": self.session.header }))?;
        }
        Ok(removed)
    }

    /// Add a cookie, e.g. a `SESSDATA` copied from a logged-in browser.
    pub fn add_cookie(&mut self, name: &str, value: &str) -> Result<()> {
        self.session
            .cookies
            .insert(name.to_owned(), value.to_owned());
        self.persist_cookies()
    }

    /// Remove a cookie. Returns whether it was present.
    pub fn remove_cookie(&mut self, name: &str) -> Result<bool> {
        let removed = self.session.cookies.remove(name).is_some();
        if removed {
            self.persist_cookies()?;
        }
        Ok(removed)
    }

    /// Drop every cookie. The next client construction bootstraps new ones.
    pub fn clear_cookies(&mut self) -> Result<()> {
        self.session.cookies.clear();
        self.persist_cookies()
    }

    /// GET `path` on the API host and return the JSON body.
    ///
    /// Returns [`BiliError::Status`] for non-2xx responses and
    /// [`BiliError::Api`] if the body's `code` is present and nonzero.
    pub(crate) fn get_json(&mut self, path: &str, params: &Value, signing: Signing) -> Result<Value> {
        let query = match signing {
            Signing::Wbi => {
                self.ensure_wbi_keys()?;
                wbi::sign(params, &self.session.img_key, &self.session.sub_key)?
            }
            Signing::Plain => wbi::to_params(params)?,
        };
        let url = format!("{API_BASE}{path}?{}", wbi::encode_query(&query));

        let resp = self.transport.get(&url, &self.request_headers())?;
        if !resp.is_success() {
            return Err(BiliError::Status {
                status: resp.status,
            });
        }
        self.absorb_cookies(&resp.set_cookies)?;

        let json = resp.json()?;
        if let Some(code) = json.get("code").and_then(Value::as_i64) {
            if code != 0 {
                let message = json
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_owned();
                return Err(BiliError::Api { code, message });
            }
        }
        Ok(json)
    }

    fn ensure_cookies(&mut self) -> Result<()> {
        if !self.session.cookies.is_empty() {
            return Ok(());
        }
        log::info!("no stored cookies, visiting {HOME_URL}");
        let resp = self.transport.get(HOME_URL, &self.request_headers())?;
        // Risk control often answers 412 here; the API still works without these cookies.
        if !resp.is_success() {
            log::error!(
                "homepage returned HTTP {}, continuing without its cookies",
                resp.status
            );
        }
        self.session.apply_set_cookies(&resp.set_cookies);
        self.persist_cookies()
    }

    fn ensure_wbi_keys(&mut self) -> Result<()> {
        if self
            .session
            .needs_key_refresh(chrono::Utc::now().timestamp())
        {
            self.refresh_wbi_keys()?;
        }
        Ok(())
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .session
            .header
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(cookie) = self.session.cookie_header() {
            headers.push(("Cookie".to_owned(), cookie));
        }
        headers
    }

    fn absorb_cookies(&mut self, set_cookies: &[String]) -> Result<()> {
        if self.session.apply_set_cookies(set_cookies) {
            self.persist_cookies()?;
        }
        Ok(())
    }

    fn persist_cookies(&self) -> Result<()> {
        self.persist(json!({ "cookies": self.session.cookies }))
    }

    fn persist(&self, partial: Value) -> Result<()> {
        let Value::Object(doc) = partial else {
            return Err(BiliError::Other("session update must be a JSON object".into()));
        };
        self.store.save(&doc)
    }
}

/// Collapse an operation's result to its neutral value, logging the failure.
///
/// Application-level rejections log at `info`, everything else at `error`.
pub(crate) fn or_neutral<T: Default>(operation: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err @ BiliError::Api { .. }) => {
            log::info!("{operation} failed: {err}");
            T::default()
        }
        Err(err) => {
            log::error!("{operation} failed: {err}");
            T::default()
        }
    }
}

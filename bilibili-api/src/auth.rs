//! Session state — request headers, cookies, and WBI keys.
//!
//! A [`Session`] is the in-memory view of the persisted
//! [`Document`](crate::store::Document). The client mutates it after every
//! response that carries `Set-Cookie` and whenever the WBI keys rotate, and
//! flushes the changed fields immediately.

use crate::error::Result;
use crate::store::Document;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// WBI keys older than this (seconds) are refetched before the next signed request.
pub const KEY_TTL_SECS: i64 = 86_400;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Persistent session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Static request headers sent with every request.
    #[serde(default = "default_headers")]
    pub header: BTreeMap<String, String>,
    /// Cookie jar, name → value.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// WBI image key (from `wbi_img.img_url`).
    #[serde(default)]
    pub img_key: String,
    /// WBI sub key (from `wbi_img.sub_url`).
    #[serde(default)]
    pub sub_key: String,
    /// Unix seconds of the last WBI key refresh.
    #[serde(default, deserialize_with = "de_timestamp")]
    pub last_update: i64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            header: default_headers(),
            cookies: BTreeMap::new(),
            img_key: String::new(),
            sub_key: String::new(),
            last_update: 0,
        }
    }
}

impl Session {
    /// Build a session from a stored document; absent fields take defaults.
    pub fn from_document(doc: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }

    /// Build the `Cookie` HTTP header value. `None` if the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// Whether the WBI keys are missing or older than [`KEY_TTL_SECS`] at `now`.
    pub fn needs_key_refresh(&self, now: i64) -> bool {
        self.img_key.is_empty()
            || self.sub_key.is_empty()
            || now.saturating_sub(self.last_update) > KEY_TTL_SECS
    }

    /// Apply raw `Set-Cookie` header values to the jar.
    ///
    /// Returns `true` if any cookie was added, changed, or expired.
    pub fn apply_set_cookies<S: AsRef<str>>(&mut self, lines: &[S]) -> bool {
        let mut changed = false;
        for line in lines {
            let Some(cookie) = parse_set_cookie(line.as_ref()) else {
                continue;
            };
            if cookie.expired {
                changed |= self.cookies.remove(&cookie.name).is_some();
            } else if self.cookies.get(&cookie.name) != Some(&cookie.value) {
                self.cookies.insert(cookie.name, cookie.value);
                changed = true;
            }
        }
        changed
    }
}

/// The headers a desktop Chrome sends to `api.bilibili.com`.
pub fn default_headers() -> BTreeMap<String, String> {
    [
        ("User-Agent", USER_AGENT),
        ("Accept", "application/json, text/plain, */*"),
        ("Accept-Language", "zh-CN,zh;q=0.9"),
        ("Connection", "keep-alive"),
        ("Content-Type", "application/x-www-form-urlencoded"),
        ("Referer", "https://www.bilibili.com"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

/// One parsed `Set-Cookie` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// `Max-Age` is zero or negative: the server asks for removal.
    pub expired: bool,
}

/// Parse `name=value; Path=/; Max-Age=...`. Attributes other than `Max-Age`
/// are ignored.
pub fn parse_set_cookie(line: &str) -> Option<SetCookie> {
    let mut parts = line.split(';').map(str::trim);
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let expired = parts
        .filter_map(|attr| attr.split_once('='))
        .filter(|(k, _)| k.trim().eq_ignore_ascii_case("max-age"))
        .any(|(_, v)| v.trim().parse::<i64>().is_ok_and(|age| age <= 0));
    Some(SetCookie {
        name: name.to_owned(),
        value: value.trim().to_owned(),
        expired,
    })
}

fn de_timestamp<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    // Older tools wrote fractional seconds.
    let ts = Option::<f64>::deserialize(d)?;
    #[allow(clippy::cast_possible_truncation)]
    Ok(ts.map_or(0, |t| t as i64))
}

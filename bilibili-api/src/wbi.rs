//! WBI request signing for Bilibili web endpoints.
//!
//! Flow: `img_key + sub_key` → permute via `MIXIN_KEY_ENC_TAB` → first 32 chars = mixin key
//! Params: add `wts` → sort by key → strip `!'()*` from values → percent-encode → `md5(query + mixin_key)` = `w_rid`

use crate::error::{BiliError, Result};
use md5::{Digest, Md5};
use serde_json::Value;
use std::collections::BTreeMap;

// Published by the Bilibili web client; a permutation of 0..64.
const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19,
    29, 28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4,
    22, 25, 54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

const MIXIN_KEY_LEN: usize = 32;

/// Characters the server drops from values before verifying `w_rid`.
const STRIPPED_CHARS: [char; 5] = ['!', '\'', '(', ')', '*'];

/// Ordered `(name, value)` query pairs, ready to be encoded with [`encode_query`].
pub type Params = Vec<(String, String)>;

/// Derive the 32-character mixin key from the two server-issued keys.
///
/// Fails with [`BiliError::InvalidKey`] if the concatenation is not ASCII or
/// shorter than the 64-entry permutation table.
pub fn mixin_key(img_key: &str, sub_key: &str) -> Result<String> {
    let orig = format!("{img_key}{sub_key}");
    if !orig.is_ascii() {
        return Err(BiliError::InvalidKey("key material is not ASCII".into()));
    }
    if orig.len() < MIXIN_KEY_ENC_TAB.len() {
        return Err(BiliError::InvalidKey(format!(
            "key material is {} bytes, need at least {}",
            orig.len(),
            MIXIN_KEY_ENC_TAB.len()
        )));
    }
    let bytes = orig.as_bytes();
    Ok(MIXIN_KEY_ENC_TAB
        .iter()
        .take(MIXIN_KEY_LEN)
        .map(|&i| char::from(bytes[i]))
        .collect())
}

/// Sign `params` (a JSON object of scalars) using the current unix time.
///
/// The returned pairs are sorted by name and end with `w_rid`.
pub fn sign(params: &Value, img_key: &str, sub_key: &str) -> Result<Params> {
    sign_at(params, img_key, sub_key, chrono::Utc::now().timestamp())
}

/// Sign `params` with an explicit `wts` timestamp (unix seconds).
pub fn sign_at(params: &Value, img_key: &str, sub_key: &str, wts: i64) -> Result<Params> {
    let mixin_key = mixin_key(img_key, sub_key)?;

    let mut sorted: BTreeMap<String, String> = to_params(params)?.into_iter().collect();
    sorted.insert("wts".to_owned(), wts.to_string());

    let mut signed: Params = sorted
        .into_iter()
        .map(|(k, v)| (k, v.replace(STRIPPED_CHARS, "")))
        .collect();

    let query = encode_query(&signed);
    log::debug!("WBI canonical query: {query}");
    let w_rid = format!("{:x}", Md5::digest(format!("{query}{mixin_key}")));
    signed.push(("w_rid".to_owned(), w_rid));
    Ok(signed)
}

/// Flatten a JSON object of scalars into query pairs, without signing.
///
/// Strings pass through as-is, `null` becomes empty, other values use their
/// JSON text (`16`, `true`).
pub fn to_params(params: &Value) -> Result<Params> {
    let obj = params
        .as_object()
        .ok_or_else(|| BiliError::Other("query params must be a JSON object".into()))?;
    Ok(obj
        .iter()
        .map(|(k, v)| (k.clone(), scalar_to_string(v)))
        .collect())
}

/// Percent-encode pairs as `k=v&k=v`.
///
/// Only `A-Z a-z 0-9 - _ . ~` pass through unescaped; a space becomes `%20`,
/// never `+`.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Extract a WBI key from one of the `wbi_img` URLs returned by `/x/web-interface/nav`.
///
/// The key is the file name stem: `https://i0.hdslb.com/bfs/wbi/7cd0...077c.png` → `7cd0...077c`.
pub fn key_from_url(url: &str) -> Result<String> {
    let (_, file) = url
        .rsplit_once('/')
        .ok_or_else(|| BiliError::InvalidKey(format!("not a URL: {url:?}")))?;
    let stem = file.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return Err(BiliError::InvalidKey(format!("no file name in {url:?}")));
    }
    Ok(stem.to_owned())
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
    const SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";

    fn get<'a>(params: &'a Params, name: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn table_is_a_permutation() {
        let mut seen = [false; 64];
        for &i in &MIXIN_KEY_ENC_TAB {
            assert!(!seen[i]);
            seen[i] = true;
        }
    }

    #[test]
    fn mixin_key_known_value() {
        assert_eq!(
            mixin_key(IMG_KEY, SUB_KEY).unwrap(),
            "ea1db124af3c7062474693fa704f4ff8"
        );
    }

    #[test]
    fn mixin_key_is_deterministic() {
        let img = "imgKeyABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let sub = "subKeyABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let a = mixin_key(img, sub).unwrap();
        let b = mixin_key(img, sub).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_eq!(a, "eyMgFCR0JCEZKKK3VuyB1DsNXWI7G69H");
    }

    #[test]
    fn mixin_key_rejects_short_input() {
        let err = mixin_key("abc", "def").unwrap_err();
        assert!(matches!(err, BiliError::InvalidKey(_)));
        assert!(mixin_key("", "").is_err());
    }

    #[test]
    fn mixin_key_rejects_non_ascii() {
        let img = "é".repeat(40);
        assert!(matches!(
            mixin_key(&img, SUB_KEY),
            Err(BiliError::InvalidKey(_))
        ));
    }

    #[test]
    fn sign_known_vector() {
        let params = json!({ "foo": "114", "bar": "514", "zab": 1_919_810 });
        let signed = sign_at(&params, IMG_KEY, SUB_KEY, 1_702_204_169).unwrap();
        let names: Vec<&str> = signed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["bar", "foo", "wts", "zab", "w_rid"]);
        assert_eq!(get(&signed, "wts"), "1702204169");
        assert_eq!(get(&signed, "w_rid"), "8f6f2b5b3d485fe1886cec6a0be8c5d4");
    }

    #[test]
    fn sign_strips_reserved_chars() {
        let signed = sign_at(&json!({ "foo": "bar!" }), IMG_KEY, SUB_KEY, 1_700_000_000).unwrap();
        assert_eq!(get(&signed, "foo"), "bar");
        let without_rid = &signed[..signed.len() - 1];
        assert_eq!(encode_query(without_rid), "foo=bar&wts=1700000000");
        assert_eq!(get(&signed, "w_rid"), "cc9a14300aec84d78d84e6c5ca73aa74");
    }

    #[test]
    fn signed_values_never_contain_reserved_chars() {
        let params = json!({ "a": "!'()*", "b": "x(y)z*", "c": "it's!" });
        let signed = sign_at(&params, IMG_KEY, SUB_KEY, 1).unwrap();
        for (_, v) in &signed {
            assert!(!v.contains(STRIPPED_CHARS), "{v}");
        }
        let query = encode_query(&signed);
        assert!(!query.contains(STRIPPED_CHARS), "{query}");
    }

    #[test]
    fn spaces_encode_as_percent_20() {
        let params = json!({ "keyword": "rock & roll (live)*", "search_type": "video", "page": 1 });
        let signed = sign_at(&params, IMG_KEY, SUB_KEY, 1_700_000_000).unwrap();
        let query = encode_query(&signed[..signed.len() - 1]);
        assert_eq!(
            query,
            "keyword=rock%20%26%20roll%20live&page=1&search_type=video&wts=1700000000"
        );
        assert_eq!(get(&signed, "w_rid"), "c3f8c2c6d99e0d4b090ea23962a0192f");
    }

    #[test]
    fn sign_is_deterministic_for_fixed_time() {
        let params = json!({ "bvid": "BV1xx411c7mD", "cid": 123, "fnval": 16 });
        let a = sign_at(&params, IMG_KEY, SUB_KEY, 42).unwrap();
        let b = sign_at(&params, IMG_KEY, SUB_KEY, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn changing_a_value_changes_the_digest() {
        let a = sign_at(&json!({ "cid": 1 }), IMG_KEY, SUB_KEY, 42).unwrap();
        let b = sign_at(&json!({ "cid": 2 }), IMG_KEY, SUB_KEY, 42).unwrap();
        assert_ne!(get(&a, "w_rid"), get(&b, "w_rid"));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut forward = serde_json::Map::new();
        forward.insert("media_id".into(), json!(1));
        forward.insert("pn".into(), json!(2));
        forward.insert("ps".into(), json!(20));
        let mut backward = serde_json::Map::new();
        backward.insert("ps".into(), json!(20));
        backward.insert("pn".into(), json!(2));
        backward.insert("media_id".into(), json!(1));

        let a = sign_at(&Value::Object(forward), IMG_KEY, SUB_KEY, 7).unwrap();
        let b = sign_at(&Value::Object(backward), IMG_KEY, SUB_KEY, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sign_rejects_non_object() {
        assert!(sign_at(&json!([1, 2]), IMG_KEY, SUB_KEY, 0).is_err());
    }

    #[test]
    fn key_from_url_takes_file_stem() {
        assert_eq!(
            key_from_url("https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png")
                .unwrap(),
            IMG_KEY
        );
        assert_eq!(key_from_url("https://x/y/abc").unwrap(), "abc");
        assert!(key_from_url("no-slash.png").is_err());
        assert!(key_from_url("https://x/y/").is_err());
    }
}

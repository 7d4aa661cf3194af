//! Session persistence — a flat key→value JSON document.
//!
//! The default file lives at `~/.config/bilibili-api/userinfo.json`:
//!
//! ```json
//! {
//!   "header": { "User-Agent": "...", "Referer": "https://www.bilibili.com" },
//!   "cookies": { "buvid3": "..." },
//!   "img_key": "7cd084941338484aae1ad9425b84077c",
//!   "sub_key": "4932caff0ff746eab6f01bf08b70ac45",
//!   "last_update": 1702204169
//! }
//! ```
//!
//! Writes are read-modify-write merges of top-level fields with no locking:
//! two clients sharing one file race, and the last writer of a field wins.

use crate::error::{BiliError, Result};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A session document: top-level field name → JSON value.
pub type Document = Map<String, Value>;

/// Storage backend for [`Session`](crate::auth::Session) state.
pub trait SessionStore {
    /// Read the whole document. A missing store yields an empty document.
    fn load(&self) -> Result<Document>;

    /// Merge `partial` into the stored document, replacing only the
    /// top-level fields it names.
    fn save(&self, partial: &Document) -> Result<()>;
}

/// File-backed store, pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at [`default_path`](Self::default_path).
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `~/.config/bilibili-api/userinfo.json` (platform config dir).
    pub fn default_path() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| BiliError::Other("cannot determine config directory".into()))?;
        Ok(config.join("bilibili-api").join("userinfo.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the session file from disk.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> Result<Document> {
        if !self.path.exists() {
            return Ok(Document::new());
        }
        let data = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&data)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(BiliError::Other(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn save(&self, partial: &Document) -> Result<()> {
        let mut doc = self.load()?;
        for (k, v) in partial {
            doc.insert(k.clone(), v.clone());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&doc)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    doc: Rc<RefCell<Document>>,
}

impl MemoryStore {
    pub fn new(doc: Document) -> Self {
        Self {
            doc: Rc::new(RefCell::new(doc)),
        }
    }

    /// Snapshot of the current document.
    pub fn snapshot(&self) -> Document {
        self.doc.borrow().clone()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Document> {
        Ok(self.snapshot())
    }

    fn save(&self, partial: &Document) -> Result<()> {
        let mut doc = self.doc.borrow_mut();
        for (k, v) in partial {
            doc.insert(k.clone(), v.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn partial(v: Value) -> Document {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_merges_without_touching_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("userinfo.json"));
        store
            .save(&partial(json!({ "header": { "Accept": "*/*" }, "img_key": "a" })))
            .unwrap();
        store.save(&partial(json!({ "img_key": "b" }))).unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc["img_key"], "b");
        assert_eq!(doc["header"]["Accept"], "*/*");
    }

    #[test]
    fn non_object_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userinfo.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(JsonFileStore::new(&path).load().is_err());
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("userinfo.json"));
        store.save(&partial(json!({ "sub_key": "x" }))).unwrap();
        assert!(store.path().exists());
        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::default();
        let view = store.clone();
        store.save(&partial(json!({ "cookies": { "a": "1" } }))).unwrap();
        store.save(&partial(json!({ "img_key": "k" }))).unwrap();
        let doc = view.snapshot();
        assert_eq!(doc["cookies"]["a"], "1");
        assert_eq!(doc["img_key"], "k");
    }
}

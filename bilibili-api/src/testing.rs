//! Scripted transport and ready-made sessions for unit tests.

use crate::error::{BiliError, Result};
use crate::store::MemoryStore;
use crate::transport::{HttpResponse, Transport};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub(crate) const IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
pub(crate) const SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";

type Request = (String, Vec<(String, String)>);

/// Replays queued responses in order and records each request.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    responses: Rc<RefCell<VecDeque<HttpResponse>>>,
    requests: Rc<RefCell<Vec<Request>>>,
}

impl MockTransport {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Rc::new(RefCell::new(responses.into())),
            requests: Rc::default(),
        }
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(u, _)| u.clone()).collect()
    }

    pub(crate) fn last_request(&self) -> Option<Request> {
        self.requests.borrow().last().cloned()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        self.requests
            .borrow_mut()
            .push((url.to_owned(), headers.to_vec()));
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| BiliError::Other(format!("unexpected request: {url}")))
    }
}

pub(crate) fn response(status: u16, set_cookies: &[&str], body: &str) -> HttpResponse {
    HttpResponse {
        status,
        set_cookies: set_cookies.iter().map(|c| (*c).to_owned()).collect(),
        body: body.to_owned(),
    }
}

/// A 200 response carrying `body` as JSON.
pub(crate) fn ok(body: Value) -> HttpResponse {
    response(200, &[], &body.to_string())
}

/// A store whose session needs no bootstrap requests.
pub(crate) fn ready_store() -> MemoryStore {
    let doc = json!({
        "header": crate::auth::default_headers(),
        "cookies": { "buvid3": "stored" },
        "img_key": IMG_KEY,
        "sub_key": SUB_KEY,
        "last_update": chrono::Utc::now().timestamp(),
    });
    let Value::Object(doc) = doc else {
        unreachable!()
    };
    MemoryStore::new(doc)
}

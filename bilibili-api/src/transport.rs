//! HTTP transport seam.
//!
//! [`BiliClient`](crate::BiliClient) issues every request through a
//! [`Transport`], so tests can script responses without touching the network.

use crate::error::Result;
use reqwest::blocking::Client;
use reqwest::header::SET_COOKIE;
use serde_json::Value;
use std::time::Duration;

/// Default request timeout for [`HttpTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status, cookies, and body of one HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Set-Cookie` header values, in response order.
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Issues one blocking GET.
pub trait Transport {
    /// GET `url` (query string already attached) with the given headers.
    ///
    /// Non-2xx statuses are returned as a normal [`HttpResponse`]; only
    /// connection-level failures are errors.
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;
}

/// [`Transport`] backed by [`reqwest::blocking::Client`].
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut req = self.http.get(url);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.send()?;
        let status = resp.status().as_u16();
        let set_cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let body = resp.text()?;

        Ok(HttpResponse {
            status,
            set_cookies,
            body,
        })
    }
}

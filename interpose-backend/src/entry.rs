//! Stored representation of a cached response.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{ETAG, HeaderName, LAST_MODIFIED};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

/// A cached response together with what is needed to validate and select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalized URL the entry was stored for.
    pub url: String,
    #[serde(with = "http_serde::status_code")]
    pub status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Request header values named by the response's `Vary` header, as they
    /// were when the entry was stored. `None` means the header was absent.
    #[serde(default)]
    pub vary: Vec<(String, Option<String>)>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(url: impl Into<String>, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
            vary: Vec::new(),
            stored_at: Utc::now(),
        }
    }

    pub fn with_vary(mut self, vary: Vec<(String, Option<String>)>) -> Self {
        self.vary = vary;
        self
    }

    pub fn with_stored_at(mut self, stored_at: DateTime<Utc>) -> Self {
        self.stored_at = stored_at;
        self
    }

    /// Stored `ETag`, byte for byte.
    pub fn etag(&self) -> Option<&str> {
        self.header(&ETAG)
    }

    /// Stored `Last-Modified`, byte for byte.
    pub fn last_modified(&self) -> Option<&str> {
        self.header(&LAST_MODIFIED)
    }

    fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }
}

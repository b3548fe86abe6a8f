//! Wire-level and final response types.
//!
//! The transport produces a [`RawResponse`]: status line, headers and a lazy
//! body. Interceptors may replace it during pre-build (a cache turning a
//! `304 Not Modified` into the stored `200`, for instance). The transport
//! then materializes a [`FinalResponse`], which post-build interceptors may
//! replace again before it is handed to the caller.

use bytes::Bytes;
use http::header::AsHeaderName;
use http::{HeaderMap, StatusCode, Uri, Version};

use crate::body::{Body, BoxError};
use crate::request::{Request, joined_header};

/// Status line and headers of a response, plus the cache provenance flag.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    /// Set when the response was synthesized from a cache entry instead of
    /// coming off the wire in full.
    pub served_from_cache: bool,
}

impl ResponseHead {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers,
            served_from_cache: false,
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Returns every value of the header `name` joined with `", "`.
    pub fn header_str<K: AsHeaderName>(&self, name: K) -> Option<String> {
        joined_header(&self.headers, name)
    }
}

/// A response as read from the transport, before it is built.
#[derive(Debug)]
pub struct RawResponse {
    pub head: ResponseHead,
    pub body: Body,
}

impl RawResponse {
    pub fn new(head: ResponseHead, body: Body) -> Self {
        Self { head, body }
    }

    /// A response with the given status, no headers and an in-memory body.
    pub fn with_status(status: StatusCode, body: impl Into<Body>) -> Self {
        Self::new(ResponseHead::new(status, HeaderMap::new()), body.into())
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn served_from_cache(&self) -> bool {
        self.head.served_from_cache
    }

    pub fn set_served_from_cache(&mut self, served_from_cache: bool) {
        self.head.served_from_cache = served_from_cache;
    }

    pub fn into_parts(self) -> (ResponseHead, Body) {
        (self.head, self.body)
    }
}

/// The response handed back to the caller.
#[derive(Debug)]
pub struct FinalResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    uri: Uri,
    body: Body,
    served_from_cache: bool,
}

impl FinalResponse {
    /// Builds the final response for `request` from a raw response,
    /// carrying over the `served_from_cache` flag.
    pub fn from_raw(request: &Request, raw: RawResponse) -> Self {
        let (head, body) = raw.into_parts();
        Self {
            status: head.status,
            version: head.version,
            headers: head.headers,
            uri: request.uri().clone(),
            body,
            served_from_cache: head.served_from_cache,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The URI of the request this response answers.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }

    pub fn set_served_from_cache(&mut self, served_from_cache: bool) {
        self.served_from_cache = served_from_cache;
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// Reads the whole body.
    pub async fn bytes(self) -> Result<Bytes, BoxError> {
        self.body.into_bytes().await
    }

    /// Reads the whole body as UTF-8 text, replacing invalid sequences.
    pub async fn text(self) -> Result<String, BoxError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

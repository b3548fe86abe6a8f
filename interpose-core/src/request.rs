//! Outgoing request representation.

use bytes::Bytes;
use http::header::{AsHeaderName, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};

/// A request travelling through the pipeline.
///
/// Header names are case-insensitive (backed by [`HeaderMap`]). Interceptors
/// receive `&mut Request` during pre-send and own it during pre-build, and
/// may rewrite any part of it there.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a request without headers or body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(uri: Uri) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Shorthand for a `PUT` request.
    pub fn put(uri: Uri) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Shorthand for a `DELETE` request.
    pub fn delete(uri: Uri) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Appends a header, keeping any value already present under that name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn uri_mut(&mut self) -> &mut Uri {
        &mut self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut Option<Bytes> {
        &mut self.body
    }

    /// Returns every value of the header `name` joined with `", "`.
    ///
    /// Values that are not visible ASCII are skipped. Returns `None` when the
    /// header is absent or no value could be read as a string.
    pub fn header_str<K: AsHeaderName>(&self, name: K) -> Option<String> {
        joined_header(&self.headers, name)
    }
}

/// Joins every string-representable value of `name` in `headers` with `", "`.
pub fn joined_header<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

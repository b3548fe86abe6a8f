//! Cache key construction.
//!
//! A [`CacheKey`] is a request method plus a normalized absolute URL. Two
//! URLs that differ only in ways HTTP considers equivalent map to the same
//! key:
//!
//! - scheme and host are lower-cased
//! - the scheme's default port is dropped
//! - an empty path becomes `/`
//! - the query string is kept verbatim
//!
//! ```
//! use http::{Method, Uri};
//! use interpose_backend::CacheKey;
//!
//! let key = CacheKey::new(&Method::GET, &Uri::from_static("HTTP://Example.COM:80?b=2&a=1"));
//! assert_eq!(key.to_string(), "GET http://example.com/?b=2&a=1");
//! ```
//!
//! [`CacheKey`] uses `Arc` internally, so cloning a key only bumps a
//! reference count.

use std::fmt;
use std::sync::Arc;

use http::{Method, Uri};
use smol_str::SmolStr;

#[derive(Debug, PartialEq, Eq, Hash)]
struct CacheKeyInner {
    method: SmolStr,
    url: String,
}

/// Identifies one cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl CacheKey {
    pub fn new(method: &Method, uri: &Uri) -> Self {
        Self {
            inner: Arc::new(CacheKeyInner {
                method: SmolStr::new(method.as_str()),
                url: normalize_url(uri),
            }),
        }
    }

    /// Key of the GET entry for `uri`, the one every cached representation
    /// of a URL is stored under.
    pub fn get(uri: &Uri) -> Self {
        Self::new(&Method::GET, uri)
    }

    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// The normalized URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.inner.method, self.inner.url)
    }
}

/// Normalizes `uri` for use in a cache key.
pub fn normalize_url(uri: &Uri) -> String {
    let mut url = String::new();
    let scheme = uri.scheme_str().map(str::to_ascii_lowercase);

    if let Some(scheme) = &scheme {
        url.push_str(scheme);
        url.push_str("://");
    }
    if let Some(host) = uri.host() {
        url.push_str(&host.to_ascii_lowercase());
        if let Some(port) = uri.port_u16() {
            let default = matches!(
                (scheme.as_deref(), port),
                (Some("http"), 80) | (Some("https"), 443)
            );
            if !default {
                url.push(':');
                url.push_str(&port.to_string());
            }
        }
    }

    match uri.path() {
        "" => url.push('/'),
        path => url.push_str(path),
    }
    if let Some(query) = uri.query() {
        url.push('?');
        url.push_str(query);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(uri: &'static str) -> String {
        normalize_url(&Uri::from_static(uri))
    }

    #[test]
    fn scheme_and_host_are_lowercased() {
        assert_eq!(normalized("HTTPS://API.Example.com/Path"), "https://api.example.com/Path");
    }

    #[test]
    fn default_ports_are_dropped() {
        assert_eq!(normalized("http://example.com:80/a"), "http://example.com/a");
        assert_eq!(normalized("https://example.com:443/a"), "https://example.com/a");
        assert_eq!(normalized("http://example.com:8080/a"), "http://example.com:8080/a");
        assert_eq!(normalized("https://example.com:80/a"), "https://example.com:80/a");
    }

    #[test]
    fn empty_path_becomes_root_and_query_is_verbatim() {
        assert_eq!(normalized("http://example.com"), "http://example.com/");
        assert_eq!(normalized("http://example.com?Z=1&a=%20"), "http://example.com/?Z=1&a=%20");
    }

    #[test]
    fn equivalent_urls_share_a_key() {
        let a = CacheKey::get(&Uri::from_static("http://EXAMPLE.com:80"));
        let b = CacheKey::get(&Uri::from_static("http://example.com/"));
        assert_eq!(a, b);
        assert_eq!(a.method(), "GET");
    }
}

//! The HTTP cache as a pipeline interceptor.
//!
//! Only GET responses are stored, always under the GET [`CacheKey`] of the
//! request URL:
//!
//! - **pre-send** answers fresh entries directly and adds conditional
//!   headers for stale entries that carry validators
//! - **pre-build** turns a `304 Not Modified` back into the stored response,
//!   tees cacheable responses into the backend through a [`CacheWriter`]
//!   and drops the entry of a URL after a successful `PUT` or `DELETE`
//! - **post-build** copies the cache provenance flag onto the final response
//!
//! Backend failures never reach the caller: a failed read is a miss, failed
//! writes and deletes are logged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::FutureExt;
use http::header::{
    CONTENT_LENGTH, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, TRANSFER_ENCODING,
    VARY,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use interpose_backend::{CacheBackend, CacheEntry, CacheKey};
use interpose_core::request::joined_header;
use interpose_core::{
    Body, Error, FinalResponse, Flow, Interceptor, RawResponse, Request, ResponseHead,
};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::freshness::{self, CacheControl, Heuristic};
use crate::state::CacheState;
use crate::writer::{CacheWriter, OnComplete};

/// Statuses whose responses may be stored.
const CACHEABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::NON_AUTHORITATIVE_INFORMATION,
    StatusCode::MULTIPLE_CHOICES,
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::PERMANENT_REDIRECT,
];

/// Headers of a `304` that never replace the stored ones.
const KEEP_ON_MERGE: [http::HeaderName; 2] = [CONTENT_LENGTH, TRANSFER_ENCODING];

/// HTTP cache interceptor over a [`CacheBackend`].
///
/// ```ignore
/// use interpose_cache::{CacheInterceptor, Heuristic};
/// use interpose_moka::MokaBackend;
///
/// let cache = CacheInterceptor::builder(MokaBackend::builder(1_000).build())
///     .heuristic(Heuristic::LastModified)
///     .build();
/// ```
pub struct CacheInterceptor<B> {
    backend: Arc<B>,
    config: CacheConfig,
}

impl<B> CacheInterceptor<B> {
    /// Create a cache interceptor over a shared backend.
    pub fn new(backend: Arc<B>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn builder(backend: B) -> CacheInterceptorBuilder<B> {
        CacheInterceptorBuilder {
            backend: Arc::new(backend),
            config: CacheConfig::default(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<B> Clone for CacheInterceptor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config,
        }
    }
}

impl<B> std::fmt::Debug for CacheInterceptor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInterceptor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CacheInterceptor`].
pub struct CacheInterceptorBuilder<B> {
    backend: Arc<B>,
    config: CacheConfig,
}

impl<B> CacheInterceptorBuilder<B> {
    pub fn cache_etags(mut self, enabled: bool) -> Self {
        self.config.cache_etags = enabled;
        self
    }

    pub fn heuristic(mut self, heuristic: Heuristic) -> Self {
        self.config.heuristic = Some(heuristic);
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> CacheInterceptor<B> {
        CacheInterceptor::new(self.backend, self.config)
    }
}

impl<B> CacheInterceptor<B>
where
    B: CacheBackend + 'static,
{
    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.backend.get(key).await {
            Ok(entry) => entry,
            Err(error) => {
                warn!(backend = self.backend.label(), %key, %error, "cache read failed");
                None
            }
        }
    }

    async fn purge(&self, key: &CacheKey) {
        match self.backend.delete(key).await {
            Ok(status) => debug!(%key, ?status, "entry invalidated"),
            Err(error) => warn!(backend = self.backend.label(), %key, %error, "cache delete failed"),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, request: &CacheControl) -> bool {
        if request.demands_revalidation() || CacheControl::parse(&entry.headers).no_cache {
            return false;
        }
        if is_permanent_redirect(entry.status) {
            return true;
        }
        let Some(lifetime) =
            freshness::freshness_lifetime(&entry.headers, self.config.heuristic, entry.stored_at)
        else {
            return false;
        };
        let age = freshness::current_age(&entry.headers, entry.stored_at, Utc::now());
        if request.max_age.is_some_and(|max_age| age >= max_age) {
            return false;
        }
        age < lifetime
    }

    /// Whether a cacheable response has anything that makes storing it useful.
    fn worth_storing(&self, status: StatusCode, headers: &HeaderMap) -> bool {
        let (etag, last_modified) = validators(headers);
        if (etag.is_some() && self.config.cache_etags) || last_modified.is_some() {
            return true;
        }
        if is_permanent_redirect(status) {
            return true;
        }
        freshness::freshness_lifetime(headers, self.config.heuristic, Utc::now())
            .is_some_and(|lifetime| lifetime > Duration::ZERO)
    }

    /// Turns a `304` into the stored response it validates.
    async fn revalidate(&self, request: &Request, key: &CacheKey, raw: RawResponse) -> RawResponse {
        let entry = match self.lookup(key).await {
            Some(entry) if vary_matches(&entry, request.headers()) => entry,
            _ => {
                debug!(%key, "304 without a matching entry, passing through");
                return raw;
            }
        };

        let (not_modified, _) = raw.into_parts();
        let mut headers = entry.headers;
        for name in not_modified.headers.keys() {
            if KEEP_ON_MERGE.contains(name) {
                continue;
            }
            headers.remove(name);
            for value in not_modified.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        let merged = CacheEntry::new(entry.url, entry.status, headers, entry.body)
            .with_vary(entry.vary);
        store(&*self.backend, key, &merged).await;
        debug!(%key, state = %CacheState::StalePendingRevalidation, "entry revalidated");

        let mut head =
            ResponseHead::new(merged.status, merged.headers).with_version(not_modified.version);
        head.served_from_cache = true;
        RawResponse::new(head, Body::from_bytes(merged.body))
    }

    /// Wraps the body of a cacheable response so it is stored once read.
    async fn write_through(&self, request: &Request, key: CacheKey, raw: RawResponse) -> RawResponse {
        let response_cc = CacheControl::parse(raw.headers());
        if response_cc.no_store {
            self.purge(&key).await;
            return raw;
        }
        if CacheControl::parse(request.headers()).no_store {
            return raw;
        }
        let status = raw.status();
        if !CACHEABLE_STATUSES.contains(&status) {
            return raw;
        }
        let Some(vary) = vary_values(raw.headers(), request.headers()) else {
            debug!(%key, "response varies on everything, not stored");
            return raw;
        };
        if !self.worth_storing(status, raw.headers()) {
            debug!(%key, "response has neither validators nor freshness, not stored");
            return raw;
        }

        debug!(%key, state = %CacheState::WriteThrough, "storing response");
        let (head, body) = raw.into_parts();
        let backend = self.backend.clone();
        let headers = head.headers.clone();
        let on_complete: OnComplete = Box::new(move |body: Bytes| {
            async move {
                if let Some(expected) = content_length(&headers)
                    && expected != body.len() as u64
                {
                    warn!(%key, expected, actual = body.len(), "truncated body, not stored");
                    return;
                }
                let entry = CacheEntry::new(key.url(), status, headers, body).with_vary(vary);
                store(&*backend, &key, &entry).await;
            }
            .boxed()
        });
        RawResponse::new(head, Body::wrap(CacheWriter::new(body, on_complete)))
    }
}

#[async_trait]
impl<B> Interceptor for CacheInterceptor<B>
where
    B: CacheBackend + 'static,
{
    fn name(&self) -> &str {
        "cache"
    }

    async fn before_send(&self, request: &mut Request) -> Result<Flow, Error> {
        if *request.method() != Method::GET {
            return Ok(Flow::Continue);
        }
        let key = CacheKey::get(request.uri());

        let entry = match self.lookup(&key).await {
            Some(entry) if vary_matches(&entry, request.headers()) => entry,
            _ => {
                debug!(%key, state = %CacheState::Miss);
                return Ok(Flow::Continue);
            }
        };

        if self.is_fresh(&entry, &CacheControl::parse(request.headers())) {
            debug!(%key, state = %CacheState::FreshHit);
            let mut head = ResponseHead::new(entry.status, entry.headers);
            head.served_from_cache = true;
            return Ok(Flow::short_circuit(RawResponse::new(
                head,
                Body::from_bytes(entry.body),
            )));
        }

        let (etag, last_modified) = validators(&entry.headers);
        if etag.is_none() && last_modified.is_none() {
            debug!(%key, state = %CacheState::Miss, "stale entry without validators");
            return Ok(Flow::Continue);
        }
        let headers = request.headers_mut();
        if let Some(etag) = etag {
            headers.insert(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = last_modified {
            headers.insert(IF_MODIFIED_SINCE, last_modified);
        }
        debug!(%key, state = %CacheState::StalePendingRevalidation);
        Ok(Flow::Continue)
    }

    async fn before_build(&self, request: Request, raw: RawResponse) -> (Request, RawResponse) {
        if raw.served_from_cache() {
            return (request, raw);
        }

        let raw = if *request.method() == Method::GET {
            let key = CacheKey::get(request.uri());
            if raw.status() == StatusCode::NOT_MODIFIED {
                self.revalidate(&request, &key, raw).await
            } else {
                self.write_through(&request, key, raw).await
            }
        } else {
            raw
        };

        let invalidating = *request.method() == Method::PUT || *request.method() == Method::DELETE;
        if invalidating && raw.status().as_u16() < 400 {
            self.purge(&CacheKey::get(request.uri())).await;
        }
        (request, raw)
    }

    async fn after_build(
        &self,
        _request: &Request,
        head: &ResponseHead,
        mut response: FinalResponse,
    ) -> FinalResponse {
        response.set_served_from_cache(head.served_from_cache);
        response
    }
}

async fn store<B: CacheBackend + ?Sized>(backend: &B, key: &CacheKey, entry: &CacheEntry) {
    match backend.set(key, entry).await {
        Ok(()) => debug!(%key, bytes = entry.body.len(), "entry stored"),
        Err(error) => warn!(backend = backend.label(), %key, %error, "cache write failed"),
    }
}

fn is_permanent_redirect(status: StatusCode) -> bool {
    status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::PERMANENT_REDIRECT
}

/// Usable `ETag` and `Last-Modified` values, copied verbatim.
///
/// A non-ASCII `ETag` or an unparsable `Last-Modified` is logged and ignored.
fn validators(headers: &HeaderMap) -> (Option<HeaderValue>, Option<HeaderValue>) {
    let etag = headers.get(ETAG).and_then(|value| match value.to_str() {
        Ok(_) => Some(value.clone()),
        Err(_) => {
            warn!(?value, "discarding non-ASCII ETag");
            None
        }
    });
    let last_modified = headers.get(LAST_MODIFIED).and_then(|value| {
        let parsed = value.to_str().ok().and_then(freshness::parse_http_date);
        match parsed {
            Some(_) => Some(value.clone()),
            None => {
                warn!(?value, "discarding malformed Last-Modified");
                None
            }
        }
    });
    (etag, last_modified)
}

/// Request header values named by the response's `Vary`, or `None` for
/// `Vary: *`.
fn vary_values(response: &HeaderMap, request: &HeaderMap) -> Option<Vec<(String, Option<String>)>> {
    let mut fields = Vec::new();
    let values = response
        .get_all(VARY)
        .iter()
        .filter_map(|value| value.to_str().ok());
    for name in values.flat_map(|value| value.split(',')) {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        if name == "*" {
            return None;
        }
        let value = joined_header(request, name.as_str());
        fields.push((name, value));
    }
    Some(fields)
}

fn vary_matches(entry: &CacheEntry, request: &HeaderMap) -> bool {
    entry
        .vary
        .iter()
        .all(|(name, stored)| joined_header(request, name.as_str()) == *stored)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
}

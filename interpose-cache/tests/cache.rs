//! Cache behavior through a full pipeline, against a scripted in-memory transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use interpose::{
    Body, Error, Pipeline, PipelineBuilder, PoolConfig, RawResponse, Request, ResponseHead,
    Transport,
};
use interpose_backend::{Backend, BackendError, BackendResult, CacheKey, DeleteStatus};
use interpose_cache::{CacheConfig, CacheInterceptor, Heuristic};
use interpose_moka::MokaBackend;
use pretty_assertions::assert_eq;

type Responder = Box<dyn Fn(&Request) -> RawResponse + Send + Sync>;

/// Answers every request through `respond` and remembers what it was sent.
struct Scripted {
    respond: Responder,
    calls: AtomicUsize,
    seen: Mutex<Vec<HeaderMap>>,
}

impl Scripted {
    fn new(respond: impl Fn(&Request) -> RawResponse + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request_headers(&self) -> HeaderMap {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Transport for Scripted {
    type Connection = ();

    fn connect(&self, _config: &PoolConfig) -> Result<(), Error> {
        Ok(())
    }

    async fn send(&self, _connection: &(), request: &Request) -> Result<RawResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.headers().clone());
        Ok((self.respond)(request))
    }
}

fn response(status: StatusCode, headers: &[(&'static str, &'static str)], body: &'static str) -> RawResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(HeaderName::from_static(*name), HeaderValue::from_static(*value));
    }
    RawResponse::new(ResponseHead::new(status, map), Body::from(body))
}

/// `200 content` with ETag `E1`, or `304` when the client already has `E1`.
fn etag_resource(request: &Request) -> RawResponse {
    if request.headers().get(IF_NONE_MATCH).is_some_and(|value| value == "E1") {
        return response(
            StatusCode::NOT_MODIFIED,
            &[("etag", "E1"), ("x-version", "2"), ("content-length", "0")],
            "",
        );
    }
    match request.method().as_str() {
        "PUT" => response(StatusCode::NO_CONTENT, &[], ""),
        _ => response(
            StatusCode::OK,
            &[("etag", "E1"), ("content-length", "7"), ("x-version", "1")],
            "content",
        ),
    }
}

fn cache_pipeline(
    transport: Scripted,
    config: CacheConfig,
) -> (Pipeline<Scripted>, Arc<MokaBackend>) {
    let backend = Arc::new(MokaBackend::builder(100).build());
    let pipeline = PipelineBuilder::new()
        .register(CacheInterceptor::new(backend.clone(), config))
        .build(transport)
        .unwrap();
    (pipeline, backend)
}

fn uri() -> Uri {
    Uri::from_static("http://example.com/cache")
}

#[tokio::test]
async fn etag_revalidation_serves_the_stored_body() {
    let (pipeline, _) = cache_pipeline(Scripted::new(etag_resource), CacheConfig::default());

    let first = pipeline.send(Request::get(uri())).await.unwrap();
    assert!(!first.served_from_cache());
    assert_eq!(first.text().await.unwrap(), "content");

    let second = pipeline.send(Request::get(uri())).await.unwrap();
    assert_eq!(pipeline.transport().last_request_headers()[IF_NONE_MATCH], "E1");
    assert_eq!(second.status(), StatusCode::OK);
    assert!(second.served_from_cache());
    assert_eq!(second.headers()["x-version"], "2");
    assert_eq!(second.headers()[CONTENT_LENGTH], "7");
    assert_eq!(second.text().await.unwrap(), "content");
    assert_eq!(pipeline.transport().calls(), 2);
}

#[tokio::test]
async fn successful_put_invalidates_the_entry() {
    let (pipeline, backend) = cache_pipeline(Scripted::new(etag_resource), CacheConfig::default());

    let first = pipeline.send(Request::get(uri())).await.unwrap();
    first.bytes().await.unwrap();
    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_some());

    pipeline.send(Request::put(uri())).await.unwrap();
    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_none());

    let after = pipeline.send(Request::get(uri())).await.unwrap();
    assert!(!after.served_from_cache());
    assert!(!pipeline.transport().last_request_headers().contains_key(IF_NONE_MATCH));

    // Invalidating an absent entry is a no-op.
    pipeline.send(Request::delete(uri())).await.unwrap();
    pipeline.send(Request::delete(uri())).await.unwrap();
}

#[tokio::test]
async fn fresh_entries_skip_the_transport() {
    let transport = Scripted::new(|_: &Request| {
        response(StatusCode::OK, &[("cache-control", "max-age=60")], "fresh")
    });
    let (pipeline, _) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();
    let second = pipeline.send(Request::get(uri())).await.unwrap();

    assert!(second.served_from_cache());
    assert_eq!(second.text().await.unwrap(), "fresh");
    assert_eq!(pipeline.transport().calls(), 1);
}

#[tokio::test]
async fn request_no_cache_forces_revalidation() {
    let transport = Scripted::new(|request: &Request| {
        if request.headers().contains_key(IF_NONE_MATCH) {
            return response(StatusCode::NOT_MODIFIED, &[], "");
        }
        response(StatusCode::OK, &[("cache-control", "max-age=60"), ("etag", "\"v1\"")], "fresh")
    });
    let (pipeline, _) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();
    let request = Request::get(uri()).with_header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    let second = pipeline.send(request).await.unwrap();

    assert_eq!(pipeline.transport().calls(), 2);
    assert_eq!(pipeline.transport().last_request_headers()[IF_NONE_MATCH], "\"v1\"");
    assert!(second.served_from_cache());
    assert_eq!(second.text().await.unwrap(), "fresh");
}

#[tokio::test]
async fn stored_no_cache_is_always_revalidated() {
    let transport = Scripted::new(|request: &Request| {
        if request.headers().contains_key(IF_NONE_MATCH) {
            return response(StatusCode::NOT_MODIFIED, &[], "");
        }
        response(
            StatusCode::OK,
            &[("cache-control", "no-cache, max-age=60"), ("etag", "\"v1\"")],
            "checked",
        )
    });
    let (pipeline, _) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();
    let second = pipeline.send(Request::get(uri())).await.unwrap();

    assert_eq!(pipeline.transport().calls(), 2);
    assert_eq!(pipeline.transport().last_request_headers()[IF_NONE_MATCH], "\"v1\"");
    assert!(second.served_from_cache());
    assert_eq!(second.text().await.unwrap(), "checked");
}

#[tokio::test]
async fn age_header_counts_against_max_age() {
    let transport = Scripted::new(|_: &Request| {
        response(
            StatusCode::OK,
            &[("cache-control", "max-age=60"), ("age", "60"), ("etag", "\"v1\"")],
            "aged",
        )
    });
    let (pipeline, _) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();
    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();

    assert_eq!(pipeline.transport().calls(), 2);
    assert_eq!(pipeline.transport().last_request_headers()[IF_NONE_MATCH], "\"v1\"");
}

#[tokio::test]
async fn last_modified_is_sent_back_verbatim() {
    let transport = Scripted::new(|_: &Request| {
        response(StatusCode::OK, &[("last-modified", "Wed, 01 May 2024 12:00:00 GMT")], "page")
    });
    let (pipeline, _) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();
    pipeline.send(Request::get(uri())).await.unwrap();

    assert_eq!(
        pipeline.transport().last_request_headers()[IF_MODIFIED_SINCE],
        "Wed, 01 May 2024 12:00:00 GMT"
    );
}

#[tokio::test]
async fn no_store_responses_are_not_kept() {
    let transport = Scripted::new(|_: &Request| {
        response(StatusCode::OK, &[("etag", "E1"), ("cache-control", "no-store")], "secret")
    });
    let (pipeline, backend) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();

    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_none());
}

#[tokio::test]
async fn etag_only_responses_need_cache_etags() {
    let config = CacheConfig {
        cache_etags: false,
        ..CacheConfig::default()
    };
    let (pipeline, backend) = cache_pipeline(Scripted::new(etag_resource), config);

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();

    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_none());
}

#[tokio::test]
async fn expires_after_heuristic_makes_plain_responses_fresh() {
    let transport = Scripted::new(|_: &Request| response(StatusCode::OK, &[], "plain"));
    let config = CacheConfig {
        heuristic: Some(Heuristic::ExpiresAfter {
            ttl: Duration::from_secs(300),
        }),
        ..CacheConfig::default()
    };
    let (pipeline, _) = cache_pipeline(transport, config);

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();
    let second = pipeline.send(Request::get(uri())).await.unwrap();

    assert!(second.served_from_cache());
    assert_eq!(pipeline.transport().calls(), 1);
}

#[tokio::test]
async fn vary_mismatch_is_a_miss() {
    let transport = Scripted::new(|_: &Request| {
        response(StatusCode::OK, &[("cache-control", "max-age=60"), ("vary", "Accept-Language")], "hallo")
    });
    let (pipeline, _) = cache_pipeline(transport, CacheConfig::default());
    let german = || {
        Request::get(uri()).with_header(
            HeaderName::from_static("accept-language"),
            HeaderValue::from_static("de"),
        )
    };

    pipeline.send(german()).await.unwrap().bytes().await.unwrap();
    assert!(pipeline.send(german()).await.unwrap().served_from_cache());

    let english = Request::get(uri()).with_header(
        HeaderName::from_static("accept-language"),
        HeaderValue::from_static("en"),
    );
    assert!(!pipeline.send(english).await.unwrap().served_from_cache());
}

#[tokio::test]
async fn vary_star_is_never_stored() {
    let transport = Scripted::new(|_: &Request| {
        response(StatusCode::OK, &[("etag", "E1"), ("vary", "*")], "x")
    });
    let (pipeline, backend) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();

    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_none());
}

#[tokio::test]
async fn unread_bodies_are_not_stored() {
    let (pipeline, backend) = cache_pipeline(Scripted::new(etag_resource), CacheConfig::default());

    drop(pipeline.send(Request::get(uri())).await.unwrap());

    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_none());
}

#[tokio::test]
async fn uncacheable_status_is_not_stored() {
    let transport = Scripted::new(|_: &Request| {
        response(StatusCode::NOT_FOUND, &[("etag", "E1"), ("cache-control", "max-age=60")], "")
    });
    let (pipeline, backend) = cache_pipeline(transport, CacheConfig::default());

    pipeline.send(Request::get(uri())).await.unwrap().bytes().await.unwrap();

    assert!(backend.read(&CacheKey::get(&uri())).await.unwrap().is_none());
}

/// A backend that is down.
struct Unavailable;

#[async_trait]
impl Backend for Unavailable {
    async fn read(&self, _key: &CacheKey) -> BackendResult<Option<bytes::Bytes>> {
        Err(BackendError::ConnectionError("connection refused".into()))
    }

    async fn write(&self, _key: &CacheKey, _value: bytes::Bytes) -> BackendResult<()> {
        Err(BackendError::ConnectionError("connection refused".into()))
    }

    async fn remove(&self, _key: &CacheKey) -> BackendResult<DeleteStatus> {
        Err(BackendError::ConnectionError("connection refused".into()))
    }
}

#[tokio::test]
async fn backend_failures_degrade_to_misses() {
    let pipeline = PipelineBuilder::new()
        .register(CacheInterceptor::builder(Unavailable).build())
        .build(Scripted::new(etag_resource))
        .unwrap();

    for _ in 0..2 {
        let response = pipeline.send(Request::get(uri())).await.unwrap();
        assert!(!response.served_from_cache());
        assert_eq!(response.text().await.unwrap(), "content");
    }
    pipeline.send(Request::put(uri())).await.unwrap();
    assert_eq!(pipeline.transport().calls(), 3);
}

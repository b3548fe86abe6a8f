//! Revalidating cache and polite throttling in front of reqwest.
//!
//! ```sh
//! RUST_LOG=interpose=debug,interpose_cache=debug cargo run -p interpose-demos --example reqwest
//! ```

use std::time::Duration;

use http::HeaderValue;
use http::header::USER_AGENT;
use interpose::{PipelineBuilder, Request};
use interpose_cache::{CacheInterceptor, Heuristic};
use interpose_moka::MokaBackend;
use interpose_policy::{DelayThrottler, ThrottleInterceptor};
use interpose_reqwest::ReqwestTransport;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("interpose=debug")),
        )
        .init();

    let cache = CacheInterceptor::builder(MokaBackend::builder(1000).build())
        .heuristic(Heuristic::LastModified)
        .build();

    // Cache first: fresh hits are answered before the throttle is consulted.
    let pipeline = PipelineBuilder::new()
        .register(cache)
        .register(ThrottleInterceptor::new(DelayThrottler::new(
            Duration::from_millis(500),
        )))
        .build(ReqwestTransport::new())?;

    let url: http::Uri = "https://api.github.com/repos/tokio-rs/tokio".parse()?;

    for attempt in 1..=2 {
        let response = pipeline
            .send(
                Request::get(url.clone())
                    .with_header(USER_AGENT, HeaderValue::from_static("interpose-demo/0.1")),
            )
            .await?;
        println!("=== Request {attempt} ===");
        println!("Status: {}", response.status());
        println!("Served from cache: {}", response.served_from_cache());
        let body = response.bytes().await?;
        println!("Body length: {} bytes", body.len());
    }

    Ok(())
}

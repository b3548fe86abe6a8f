//! A pipeline assembled from a YAML document.

use http::Uri;
use interpose::Request;
use interpose_configuration::PipelineConfig;
use interpose_reqwest::ReqwestTransport;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
pool:
  max_idle_per_host: 2
  connect_timeout: 10s
tls_version: TLSv1.3
throttle:
  Window:
    count: 30
    interval: 1m
cache:
  heuristic:
    ExpiresAfter:
      ttl: 5m
  backend:
    type: Moka
    max_capacity: 500
    format: Bincode
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pipeline = PipelineConfig::from_yaml(CONFIG)?.build(ReqwestTransport::new())?;
    println!("Interceptors: {:?}", pipeline.interceptor_names().collect::<Vec<_>>());
    println!("Pool: {:?}", pipeline.pool_config());

    let url = Uri::from_static("https://www.rust-lang.org/");
    for _ in 0..2 {
        let response = pipeline.send(Request::get(url.clone())).await?;
        println!(
            "{} (from cache: {})",
            response.status(),
            response.served_from_cache()
        );
        response.bytes().await?;
    }
    Ok(())
}

use async_trait::async_trait;
use interpose_core::{
    Body, Error, PoolConfig, RawResponse, Request, ResponseHead, TlsVersion, Transport,
};
use reqwest::{Client, ClientBuilder, tls};
use tracing::{debug, trace};

/// Sends requests through a [`reqwest::Client`] built from the pool
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    user_agent: Option<String>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `User-Agent` sent when a request does not carry its own.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn client_builder(&self, config: &PoolConfig) -> ClientBuilder {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        // reqwest binds the local IP only; the port is picked by the OS.
        if let Some(address) = config.source_address {
            builder = builder.local_address(address.ip());
        }
        if let Some(version) = config.tls_version {
            let version = tls_version(version);
            builder = builder.min_tls_version(version).max_tls_version(version);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder
    }
}

fn tls_version(version: TlsVersion) -> tls::Version {
    match version {
        TlsVersion::Tls1_0 => tls::Version::TLS_1_0,
        TlsVersion::Tls1_1 => tls::Version::TLS_1_1,
        TlsVersion::Tls1_2 => tls::Version::TLS_1_2,
        TlsVersion::Tls1_3 => tls::Version::TLS_1_3,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Connection = Client;

    fn connect(&self, config: &PoolConfig) -> Result<Client, Error> {
        debug!(?config, "building reqwest client");
        self.client_builder(config).build().map_err(Error::transport)
    }

    async fn send(&self, client: &Client, request: &Request) -> Result<RawResponse, Error> {
        let mut outgoing = client
            .request(request.method().clone(), request.uri().to_string())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            outgoing = outgoing.body(body.clone());
        }

        let response = outgoing.send().await.map_err(Error::transport)?;
        trace!(status = %response.status(), url = %response.url(), "response head received");

        let response: http::Response<reqwest::Body> = response.into();
        let (parts, body) = response.into_parts();
        let head = ResponseHead::new(parts.status, parts.headers).with_version(parts.version);
        Ok(RawResponse::new(head, Body::wrap(body)))
    }
}

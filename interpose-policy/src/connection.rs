//! Interceptors that shape the connection pool.

use std::net::SocketAddr;

use async_trait::async_trait;
use interpose_core::{Interceptor, PoolConfig, PoolOverrides, PoolSetup, TlsVersion};

/// Binds outgoing connections to a local address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceAddressInterceptor {
    address: SocketAddr,
}

impl SourceAddressInterceptor {
    pub fn new(address: SocketAddr) -> Self {
        Self { address }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

#[async_trait]
impl Interceptor for SourceAddressInterceptor {
    fn name(&self) -> &str {
        "source_address"
    }

    fn configure_pool(&self, _config: &PoolConfig) -> Option<PoolSetup> {
        Some(PoolSetup::Override(PoolOverrides::source_address(
            self.address,
        )))
    }
}

/// Pins the TLS protocol version of every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsVersionInterceptor {
    version: TlsVersion,
}

impl TlsVersionInterceptor {
    pub fn new(version: TlsVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> TlsVersion {
        self.version
    }
}

#[async_trait]
impl Interceptor for TlsVersionInterceptor {
    fn name(&self) -> &str {
        "tls_version"
    }

    fn configure_pool(&self, _config: &PoolConfig) -> Option<PoolSetup> {
        Some(PoolSetup::Override(PoolOverrides::tls_version(self.version)))
    }
}

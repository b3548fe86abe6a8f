//! Connection pool configuration and the overrides interceptors contribute.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TLS protocol version pinned for every connection of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "TLSv1")]
    Tls1_0,
    #[serde(rename = "TLSv1.1")]
    Tls1_1,
    #[serde(rename = "TLSv1.2")]
    Tls1_2,
    #[serde(rename = "TLSv1.3")]
    Tls1_3,
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TlsVersion::Tls1_0 => "TLSv1",
            TlsVersion::Tls1_1 => "TLSv1.1",
            TlsVersion::Tls1_2 => "TLSv1.2",
            TlsVersion::Tls1_3 => "TLSv1.3",
        };
        f.write_str(name)
    }
}

/// Settings the transport uses to build its connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    /// How long an idle connection is kept around (e.g. "90s").
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    /// Connect timeout (e.g. "10s").
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,
    /// Local address outgoing connections are bound to.
    pub source_address: Option<SocketAddr>,
    /// TLS version pinned for every connection.
    pub tls_version: Option<TlsVersion>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Some(Duration::from_secs(90)),
            connect_timeout: None,
            source_address: None,
            tls_version: None,
        }
    }
}

impl PoolConfig {
    /// Name of the first setting on which `self` and `other` disagree.
    pub fn differing_setting(&self, other: &PoolConfig) -> Option<&'static str> {
        if self.max_idle_per_host != other.max_idle_per_host {
            Some("max_idle_per_host")
        } else if self.idle_timeout != other.idle_timeout {
            Some("idle_timeout")
        } else if self.connect_timeout != other.connect_timeout {
            Some("connect_timeout")
        } else if self.source_address != other.source_address {
            Some("source_address")
        } else if self.tls_version != other.tls_version {
            Some("tls_version")
        } else {
            None
        }
    }
}

/// Partial pool configuration: every `Some` field replaces the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOverrides {
    pub max_idle_per_host: Option<usize>,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,
    pub source_address: Option<SocketAddr>,
    pub tls_version: Option<TlsVersion>,
}

impl PoolOverrides {
    pub fn source_address(address: SocketAddr) -> Self {
        Self {
            source_address: Some(address),
            ..Self::default()
        }
    }

    pub fn tls_version(version: TlsVersion) -> Self {
        Self {
            tls_version: Some(version),
            ..Self::default()
        }
    }

    /// Writes every set field into `config`.
    pub fn apply_to(&self, config: &mut PoolConfig) {
        if let Some(max_idle) = self.max_idle_per_host {
            config.max_idle_per_host = max_idle;
        }
        if let Some(timeout) = self.idle_timeout {
            config.idle_timeout = Some(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout = Some(timeout);
        }
        if let Some(address) = self.source_address {
            config.source_address = Some(address);
        }
        if let Some(version) = self.tls_version {
            config.tls_version = Some(version);
        }
    }

    /// Name of the first set field whose value differs from `config`.
    pub fn conflicting_setting(&self, config: &PoolConfig) -> Option<&'static str> {
        if self
            .max_idle_per_host
            .is_some_and(|max_idle| max_idle != config.max_idle_per_host)
        {
            return Some("max_idle_per_host");
        }
        if differs(self.idle_timeout, config.idle_timeout) {
            return Some("idle_timeout");
        }
        if differs(self.connect_timeout, config.connect_timeout) {
            return Some("connect_timeout");
        }
        if differs(self.source_address, config.source_address) {
            return Some("source_address");
        }
        if differs(self.tls_version, config.tls_version) {
            return Some("tls_version");
        }
        None
    }
}

fn differs<T: PartialEq>(requested: Option<T>, current: Option<T>) -> bool {
    requested.is_some() && requested != current
}

/// What an interceptor contributes while the pool is being configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSetup {
    /// Partial override folded over the configuration.
    Override(PoolOverrides),
    /// Complete configuration used as is.
    Replace(PoolConfig),
}

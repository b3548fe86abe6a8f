use serde::{Deserialize, Serialize};

use crate::freshness::Heuristic;

/// Tunables of the [`CacheInterceptor`](crate::CacheInterceptor).
///
/// ```yaml
/// cache_etags: true
/// heuristic:
///   ExpiresAfter:
///     ttl: 1h
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store responses whose only validator is an `ETag`.
    pub cache_etags: bool,
    /// Freshness to assume when a response does not state its own.
    pub heuristic: Option<Heuristic>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_etags: true,
            heuristic: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_yaml() {
        let yaml = r#"
cache_etags: false
heuristic:
  ExpiresAfter:
    ttl: 90s
"#;
        let config: CacheConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(
            config,
            CacheConfig {
                cache_etags: false,
                heuristic: Some(Heuristic::ExpiresAfter {
                    ttl: Duration::from_secs(90)
                }),
            }
        );
    }

    #[test]
    fn unit_heuristic_and_defaults() {
        let config: CacheConfig = serde_saphyr::from_str("heuristic: LastModified").unwrap();
        assert!(config.cache_etags);
        assert_eq!(config.heuristic, Some(Heuristic::LastModified));
    }
}

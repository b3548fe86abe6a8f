//! `Cache-Control` parsing and freshness computation.
//!
//! The freshness lifetime of a stored response is, in order of precedence:
//!
//! 1. the configured [`Heuristic::ExpiresAfter`] ttl, if any
//! 2. `Cache-Control: max-age`
//! 3. `Expires` minus `Date`
//! 4. the configured [`Heuristic::LastModified`] estimate
//!
//! A response is fresh while its age is below that lifetime.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::{AGE, CACHE_CONTROL, DATE, EXPIRES, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Upper bound of the [`Heuristic::LastModified`] estimate.
const LAST_MODIFIED_CAP: Duration = Duration::from_secs(24 * 60 * 60);

/// Freshness to assume for responses that do not state their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heuristic {
    /// Every stored response is fresh for `ttl`, whatever its headers say.
    ExpiresAfter {
        #[serde(with = "humantime_serde")]
        ttl: Duration,
    },
    /// A tenth of the time between `Date` and `Last-Modified`, capped at one
    /// day. Only applies when the response has no explicit freshness.
    LastModified,
}

/// The directives of all `Cache-Control` headers of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub max_age: Option<Duration>,
}

impl CacheControl {
    pub fn parse(headers: &HeaderMap) -> Self {
        let mut directives = CacheControl::default();
        let values = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok());

        for directive in values.flat_map(|value| value.split(',')) {
            let (name, argument) = match directive.split_once('=') {
                Some((name, argument)) => (name.trim(), Some(argument.trim().trim_matches('"'))),
                None => (directive.trim(), None),
            };
            match name.to_ascii_lowercase().as_str() {
                "no-cache" => directives.no_cache = true,
                "no-store" => directives.no_store = true,
                "max-age" => match argument.map(str::parse::<u64>) {
                    Some(Ok(seconds)) => directives.max_age = Some(Duration::from_secs(seconds)),
                    _ => warn!(?argument, "ignoring malformed max-age"),
                },
                _ => {}
            }
        }
        directives
    }

    /// A request asking for an end-to-end revalidation.
    pub fn demands_revalidation(&self) -> bool {
        self.no_cache || self.max_age == Some(Duration::ZERO)
    }
}

/// Parses an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Formats `date` as an HTTP date.
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn header_date(headers: &HeaderMap, name: http::HeaderName) -> Option<DateTime<Utc>> {
    let value = headers.get(&name)?.to_str().ok()?;
    let date = parse_http_date(value);
    if date.is_none() {
        warn!(header = %name, value, "discarding unparsable date");
    }
    date
}

/// Freshness lifetime of a response with `headers`.
///
/// `fallback_date` stands in for a missing `Date` header. Returns `None`
/// when neither the headers nor the heuristic give a lifetime.
pub fn freshness_lifetime(
    headers: &HeaderMap,
    heuristic: Option<Heuristic>,
    fallback_date: DateTime<Utc>,
) -> Option<Duration> {
    if let Some(Heuristic::ExpiresAfter { ttl }) = heuristic {
        return Some(ttl);
    }

    if let Some(max_age) = CacheControl::parse(headers).max_age {
        return Some(max_age);
    }

    let date = header_date(headers, DATE).unwrap_or(fallback_date);
    if headers.contains_key(EXPIRES) {
        // An invalid Expires means "already expired".
        let expires = header_date(headers, EXPIRES).unwrap_or(date);
        return Some((expires - date).to_std().unwrap_or(Duration::ZERO));
    }

    if heuristic == Some(Heuristic::LastModified) {
        let last_modified = header_date(headers, LAST_MODIFIED)?;
        let since = (date - last_modified).to_std().unwrap_or(Duration::ZERO);
        return Some((since / 10).min(LAST_MODIFIED_CAP));
    }
    None
}

/// Age of a response that was stored at `stored_at`, as of `now`.
///
/// The `Date` header is preferred over the storage time when present. An
/// `Age` header adds the time the response had already spent in upstream
/// caches.
pub fn current_age(headers: &HeaderMap, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let date = header_date(headers, DATE).unwrap_or(stored_at);
    let resident = (now - date).to_std().unwrap_or(Duration::ZERO);
    let upstream = headers
        .get(AGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_default();
    resident.saturating_add(upstream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn directives_are_collected_across_headers() {
        let cc = CacheControl::parse(&headers(&[
            ("cache-control", "public, Max-Age=60"),
            ("cache-control", "no-store"),
        ]));
        assert_eq!(cc.max_age, Some(Duration::from_secs(60)));
        assert!(cc.no_store);
        assert!(!cc.no_cache);
    }

    #[test]
    fn request_revalidation_directives() {
        assert!(CacheControl::parse(&headers(&[("cache-control", "no-cache")])).demands_revalidation());
        assert!(CacheControl::parse(&headers(&[("cache-control", "max-age=0")])).demands_revalidation());
        assert!(!CacheControl::parse(&headers(&[("cache-control", "max-age=5")])).demands_revalidation());
    }

    #[test]
    fn http_dates_round_trip() {
        let formatted = format_http_date(noon());
        assert_eq!(formatted, "Wed, 01 May 2024 12:00:00 GMT");
        assert_eq!(parse_http_date(&formatted), Some(noon()));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn max_age_wins_over_expires() {
        let headers = headers(&[
            ("cache-control", "max-age=30"),
            ("date", "Wed, 01 May 2024 12:00:00 GMT"),
            ("expires", "Wed, 01 May 2024 13:00:00 GMT"),
        ]);
        assert_eq!(
            freshness_lifetime(&headers, None, noon()),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn expires_relative_to_date() {
        let headers = headers(&[
            ("date", "Wed, 01 May 2024 12:00:00 GMT"),
            ("expires", "Wed, 01 May 2024 13:00:00 GMT"),
        ]);
        assert_eq!(
            freshness_lifetime(&headers, None, noon()),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn invalid_expires_is_already_expired() {
        let headers = headers(&[("expires", "0")]);
        assert_eq!(freshness_lifetime(&headers, None, noon()), Some(Duration::ZERO));
    }

    #[test]
    fn last_modified_heuristic_is_a_tenth_capped_at_a_day() {
        let recent = headers(&[
            ("date", "Wed, 01 May 2024 12:00:00 GMT"),
            ("last-modified", "Wed, 01 May 2024 02:00:00 GMT"),
        ]);
        assert_eq!(
            freshness_lifetime(&recent, Some(Heuristic::LastModified), noon()),
            Some(Duration::from_secs(3600))
        );

        let old = headers(&[
            ("date", "Wed, 01 May 2024 12:00:00 GMT"),
            ("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT"),
        ]);
        assert_eq!(
            freshness_lifetime(&old, Some(Heuristic::LastModified), noon()),
            Some(LAST_MODIFIED_CAP)
        );
        assert_eq!(freshness_lifetime(&old, None, noon()), None);
    }

    #[test]
    fn expires_after_overrides_headers() {
        let headers = headers(&[("cache-control", "max-age=5")]);
        let heuristic = Heuristic::ExpiresAfter {
            ttl: Duration::from_secs(600),
        };
        assert_eq!(
            freshness_lifetime(&headers, Some(heuristic), noon()),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn age_prefers_date_header() {
        let headers = headers(&[("date", "Wed, 01 May 2024 11:59:00 GMT")]);
        let later = noon() + chrono::Duration::seconds(30);
        assert_eq!(current_age(&headers, noon(), later), Duration::from_secs(90));
        assert_eq!(current_age(&HeaderMap::new(), noon(), later), Duration::from_secs(30));
    }

    #[test]
    fn age_header_adds_to_the_resident_time() {
        let stored = headers(&[("date", "Wed, 01 May 2024 12:00:00 GMT"), ("age", "100")]);
        let now = noon() + chrono::Duration::seconds(20);

        assert_eq!(current_age(&stored, noon(), now), Duration::from_secs(120));
    }

    #[test]
    fn malformed_age_header_is_ignored() {
        let stored = headers(&[("age", "a while")]);
        let now = noon() + chrono::Duration::seconds(20);

        assert_eq!(current_age(&stored, noon(), now), Duration::from_secs(20));
    }
}

//! robots.txt enforcement.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use http::Uri;
use http::header::USER_AGENT;
use interpose_core::{Error, Flow, Interceptor, PolicyRejection, Request};
use smol_str::SmolStr;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Agent used when a request carries no `User-Agent`.
pub const ANY_AGENT: &str = "*";

/// Source of robots.txt decisions.
pub trait RobotsRules: Send + Sync {
    /// Whether `agent` may fetch `url`.
    fn allowed(&self, url: &Uri, agent: &str) -> bool;

    /// Minimum time between two requests of `agent` to the host of `url`.
    fn crawl_delay(&self, url: &Uri, agent: &str) -> Option<Duration>;
}

/// Rules for one user agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRules {
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay: Option<Duration>,
}

impl AgentRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, prefix: impl Into<String>) -> Self {
        self.allow.push(prefix.into());
        self
    }

    pub fn disallow(mut self, prefix: impl Into<String>) -> Self {
        self.disallow.push(prefix.into());
        self
    }

    pub fn crawl_delay(mut self, delay: Duration) -> Self {
        self.crawl_delay = Some(delay);
        self
    }

    /// The longest matching rule wins; `Allow` wins a tie.
    fn allows(&self, path: &str) -> bool {
        let longest = |prefixes: &[String]| {
            prefixes
                .iter()
                .filter(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
                .map(String::len)
                .max()
        };
        match (longest(&self.allow), longest(&self.disallow)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) => allow >= disallow,
        }
    }
}

/// An in-memory robots table keyed by agent, falling back to `*`.
///
/// ```
/// use std::time::Duration;
/// use http::Uri;
/// use interpose_policy::{AgentRules, RobotsRules, StaticRules};
///
/// let rules = StaticRules::new()
///     .agent("*", AgentRules::new().disallow("/private"))
///     .agent("mybot", AgentRules::new().crawl_delay(Duration::from_secs(5)));
///
/// let url = Uri::from_static("http://example.com/private/page");
/// assert!(!rules.allowed(&url, "otherbot/2.1"));
/// assert!(rules.allowed(&url, "MyBot/1.0"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRules {
    agents: HashMap<SmolStr, AgentRules>,
}

impl StaticRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers rules for `agent`. Agent names are case-insensitive.
    pub fn agent(mut self, agent: &str, rules: AgentRules) -> Self {
        self.agents.insert(SmolStr::new(agent.to_ascii_lowercase()), rules);
        self
    }

    /// Parses the `User-agent`, `Allow`, `Disallow` and `Crawl-delay` lines of
    /// a robots.txt document. Other lines are ignored.
    pub fn parse(robots_txt: &str) -> Self {
        let mut rules = Self::new();
        let mut group: Vec<SmolStr> = Vec::new();
        let mut in_rules = false;

        for line in robots_txt.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match field.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    let agent = SmolStr::new(value.to_ascii_lowercase());
                    rules.agents.entry(agent.clone()).or_default();
                    group.push(agent);
                }
                directive => {
                    in_rules = true;
                    for agent in &group {
                        let Some(entry) = rules.agents.get_mut(agent) else {
                            continue;
                        };
                        match directive {
                            "allow" => entry.allow.push(value.to_owned()),
                            "disallow" => entry.disallow.push(value.to_owned()),
                            "crawl-delay" => match value
                                .parse::<f64>()
                                .ok()
                                .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
                            {
                                Some(delay) => entry.crawl_delay = Some(delay),
                                None => warn!(value, "ignoring malformed crawl-delay"),
                            },
                            _ => {}
                        }
                    }
                }
            }
        }
        rules
    }

    fn rules_for(&self, agent: &str) -> Option<&AgentRules> {
        let token = agent
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.agents
            .get(token.as_str())
            .or_else(|| self.agents.get(ANY_AGENT))
    }
}

impl RobotsRules for StaticRules {
    fn allowed(&self, url: &Uri, agent: &str) -> bool {
        self.rules_for(agent)
            .is_none_or(|rules| rules.allows(url.path()))
    }

    fn crawl_delay(&self, _url: &Uri, agent: &str) -> Option<Duration> {
        self.rules_for(agent).and_then(|rules| rules.crawl_delay)
    }
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    at: Instant,
    delay: Duration,
}

/// Enforces robots rules: disallowed URLs are rejected, and requests of one
/// agent to one host are spaced by the crawl delay.
///
/// Visits are remembered per (agent, host) only while their crawl delay
/// runs; expired ones are pruned whenever a new visit is recorded.
pub struct RobotsInterceptor<R> {
    rules: R,
    visited: DashMap<(SmolStr, SmolStr), Visit>,
}

impl<R: RobotsRules> RobotsInterceptor<R> {
    pub fn new(rules: R) -> Self {
        Self {
            rules,
            visited: DashMap::new(),
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// When `agent` last got through to `host`.
    pub fn last_visit(&self, agent: &str, host: &str) -> Option<Instant> {
        self.visited
            .get(&(SmolStr::new(agent), SmolStr::new(host)))
            .map(|visit| visit.at)
    }

    fn check_crawl_delay(&self, url: &Uri, agent: &str) -> Result<(), PolicyRejection> {
        let Some(delay) = self.rules.crawl_delay(url, agent) else {
            return Ok(());
        };
        let host = url.host().unwrap_or_default().to_ascii_lowercase();
        let now = Instant::now();

        let key = (SmolStr::new(agent), SmolStr::new(host));

        self.visited
            .retain(|_, visit| now.duration_since(visit.at) < visit.delay);
        match self.visited.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(Visit { at: now, delay });
            }
            Entry::Occupied(mut visit) => {
                let elapsed = now.duration_since(visit.get().at);
                if elapsed < delay {
                    return Err(PolicyRejection::Throttled {
                        url: url.to_string(),
                        retry_after: Some(delay - elapsed),
                    });
                }
                visit.insert(Visit { at: now, delay });
            }
        }
        Ok(())
    }
}

impl<R> std::fmt::Debug for RobotsInterceptor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotsInterceptor")
            .field("visited", &self.visited.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: RobotsRules> Interceptor for RobotsInterceptor<R> {
    fn name(&self) -> &str {
        "robots"
    }

    async fn before_send(&self, request: &mut Request) -> Result<Flow, Error> {
        let agent = request
            .header_str(USER_AGENT)
            .unwrap_or_else(|| ANY_AGENT.to_owned());
        let url = request.uri();

        if !self.rules.allowed(url, &agent) {
            debug!(%url, agent = %agent, "disallowed by robots rules");
            return Err(PolicyRejection::Disallowed {
                url: url.to_string(),
                agent,
            }
            .into());
        }
        self.check_crawl_delay(url, &agent)?;
        Ok(Flow::Continue)
    }
}

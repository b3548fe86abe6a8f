use std::time::Duration;

use interpose::PipelineBuilder;
use interpose_policy::{
    DelayThrottler, EveryInterval, RobotsInterceptor, StaticRules, ThrottleInterceptor,
    WindowThrottler, per_hour,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_interval() -> Duration {
    per_hour().0
}

/// Request budget enforced before anything is sent.
///
/// ```yaml
/// Window:
///   count: 100
///   interval: 1h
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Throttle {
    /// At least `delay` between two requests.
    Delay {
        #[serde(with = "humantime_serde")]
        delay: Duration,
    },
    /// At most `count` requests per `interval` (one hour by default).
    Window {
        count: u64,
        #[serde(with = "humantime_serde", default = "default_interval")]
        interval: Duration,
    },
}

impl Throttle {
    pub(crate) fn register(self, builder: PipelineBuilder) -> Result<PipelineBuilder, ConfigError> {
        Ok(match self {
            Throttle::Delay { delay } => {
                builder.register(ThrottleInterceptor::new(DelayThrottler::new(delay)))
            }
            Throttle::Window { count: 0, .. } => {
                return Err(ConfigError::Invalid {
                    field: "throttle.Window.count",
                    reason: "must be greater than zero".to_owned(),
                });
            }
            Throttle::Window { count, interval } => builder.register(ThrottleInterceptor::new(
                WindowThrottler::new(count, EveryInterval(interval)),
            )),
        })
    }
}

/// robots.txt rules, given inline.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Robots {
    pub rules: String,
}

impl Robots {
    pub(crate) fn register(self, builder: PipelineBuilder) -> PipelineBuilder {
        builder.register(RobotsInterceptor::new(StaticRules::parse(&self.rules)))
    }
}

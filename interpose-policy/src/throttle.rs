//! Client-side request throttling.
//!
//! A [`ThrottleInterceptor`] asks its [`Throttler`] before every request and
//! tells it about every response. Rejections are immediate: the caller gets
//! [`PolicyRejection::Throttled`] and decides whether and when to retry.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use interpose_core::{
    Error, FinalResponse, Flow, Interceptor, PolicyRejection, Request, ResponseHead,
};
use tokio::time::Instant;
use tracing::debug;

/// Decides whether a request may go out now.
pub trait Throttler: Send + Sync {
    /// Rejects the request if it would exceed the budget.
    fn check(&self, request: &Request) -> Result<(), PolicyRejection>;

    /// Accounts for a completed request.
    fn record(&self, request: &Request, response: &FinalResponse);
}

/// Enforces a minimum delay between consecutive requests.
#[derive(Debug)]
pub struct DelayThrottler {
    delay: Duration,
    last_visit: Mutex<Option<Instant>>,
}

impl DelayThrottler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_visit: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Throttler for DelayThrottler {
    fn check(&self, request: &Request) -> Result<(), PolicyRejection> {
        let Some(last_visit) = *lock(&self.last_visit) else {
            return Ok(());
        };
        let elapsed = last_visit.elapsed();
        if elapsed < self.delay {
            return Err(PolicyRejection::Throttled {
                url: request.uri().to_string(),
                retry_after: Some(self.delay - elapsed),
            });
        }
        Ok(())
    }

    fn record(&self, _request: &Request, _response: &FinalResponse) {
        *lock(&self.last_visit) = Some(Instant::now());
    }
}

/// Decides when a [`WindowThrottler`] starts counting from zero again.
pub trait Resetter: Send + Sync {
    fn should_reset(&self, last_reset: Instant, now: Instant) -> bool;

    /// When the next reset is due, if known. Used as a retry hint.
    fn next_reset(&self, _last_reset: Instant) -> Option<Instant> {
        None
    }
}

/// Resets the window once `interval` has passed since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EveryInterval(pub Duration);

impl Resetter for EveryInterval {
    fn should_reset(&self, last_reset: Instant, now: Instant) -> bool {
        now.duration_since(last_reset) >= self.0
    }

    fn next_reset(&self, last_reset: Instant) -> Option<Instant> {
        Some(last_reset + self.0)
    }
}

impl<F> Resetter for F
where
    F: Fn(Instant, Instant) -> bool + Send + Sync,
{
    fn should_reset(&self, last_reset: Instant, now: Instant) -> bool {
        self(last_reset, now)
    }
}

/// An hourly window.
pub fn per_hour() -> EveryInterval {
    EveryInterval(Duration::from_secs(60 * 60))
}

#[derive(Debug)]
struct Window {
    last_reset: Instant,
    visits: u64,
}

/// Allows `count` requests per window; the [`Resetter`] decides when a new
/// window starts.
pub struct WindowThrottler<R = EveryInterval> {
    count: u64,
    resetter: R,
    window: Mutex<Window>,
}

impl<R: Resetter> WindowThrottler<R> {
    pub fn new(count: u64, resetter: R) -> Self {
        Self {
            count,
            resetter,
            window: Mutex::new(Window {
                last_reset: Instant::now(),
                visits: 0,
            }),
        }
    }

    /// Requests recorded in the current window.
    pub fn visits(&self) -> u64 {
        lock(&self.window).visits
    }
}

impl WindowThrottler<EveryInterval> {
    /// At most `count` requests per hour.
    pub fn per_hour(count: u64) -> Self {
        Self::new(count, per_hour())
    }
}

impl<R: Resetter> Throttler for WindowThrottler<R> {
    fn check(&self, request: &Request) -> Result<(), PolicyRejection> {
        let mut window = lock(&self.window);
        let now = Instant::now();
        if self.resetter.should_reset(window.last_reset, now) {
            debug!(visits = window.visits, "throttle window reset");
            window.last_reset = now;
            window.visits = 0;
        }
        if window.visits >= self.count {
            let retry_after = self
                .resetter
                .next_reset(window.last_reset)
                .map(|at| at.saturating_duration_since(now));
            return Err(PolicyRejection::Throttled {
                url: request.uri().to_string(),
                retry_after,
            });
        }
        Ok(())
    }

    fn record(&self, _request: &Request, _response: &FinalResponse) {
        lock(&self.window).visits += 1;
    }
}

impl<R> std::fmt::Debug for WindowThrottler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowThrottler")
            .field("count", &self.count)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// Rejects requests its [`Throttler`] refuses and reports completed ones back.
#[derive(Debug)]
pub struct ThrottleInterceptor<T> {
    throttler: T,
}

impl<T: Throttler> ThrottleInterceptor<T> {
    pub fn new(throttler: T) -> Self {
        Self { throttler }
    }

    pub fn throttler(&self) -> &T {
        &self.throttler
    }
}

#[async_trait]
impl<T: Throttler> Interceptor for ThrottleInterceptor<T> {
    fn name(&self) -> &str {
        "throttle"
    }

    async fn before_send(&self, request: &mut Request) -> Result<Flow, Error> {
        self.throttler.check(request)?;
        Ok(Flow::Continue)
    }

    async fn after_build(
        &self,
        request: &Request,
        _head: &ResponseHead,
        response: FinalResponse,
    ) -> FinalResponse {
        self.throttler.record(request, &response);
        response
    }
}

/// Locks `mutex`, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{StatusCode, Uri};
    use interpose_core::RawResponse;

    fn request() -> Request {
        Request::get(Uri::from_static("http://example.com/"))
    }

    fn response() -> FinalResponse {
        FinalResponse::from_raw(&request(), RawResponse::with_status(StatusCode::OK, ""))
    }

    #[tokio::test(start_paused = true)]
    async fn delay_throttler_rejects_until_delay_elapsed() {
        let throttler = DelayThrottler::new(Duration::from_secs(2));
        assert!(throttler.check(&request()).is_ok());
        throttler.record(&request(), &response());

        tokio::time::advance(Duration::from_millis(500)).await;
        match throttler.check(&request()) {
            Err(PolicyRejection::Throttled { retry_after, .. }) => {
                assert_eq!(retry_after, Some(Duration::from_millis(1500)))
            }
            other => panic!("expected throttling, got {other:?}"),
        }

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(throttler.check(&request()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn window_throttler_resets_every_interval() {
        let throttler = WindowThrottler::new(2, EveryInterval(Duration::from_secs(60)));
        for _ in 0..2 {
            assert!(throttler.check(&request()).is_ok());
            throttler.record(&request(), &response());
        }
        assert!(throttler.check(&request()).is_err());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(throttler.check(&request()).is_ok());
        assert_eq!(throttler.visits(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn per_hour_window() {
        let throttler = WindowThrottler::per_hour(1);
        throttler.record(&request(), &response());

        tokio::time::advance(Duration::from_secs(59 * 60)).await;
        match throttler.check(&request()) {
            Err(PolicyRejection::Throttled { retry_after, .. }) => {
                assert_eq!(retry_after, Some(Duration::from_secs(60)))
            }
            other => panic!("expected throttling, got {other:?}"),
        }

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(throttler.check(&request()).is_ok());
    }

    #[test]
    fn closures_are_resetters() {
        let never = |_: Instant, _: Instant| false;
        let throttler = WindowThrottler::new(0, never);
        assert!(throttler.check(&request()).is_err());
    }
}

//! Rate-limit aware decorator for any [`GraphQlGateway`].

use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};

use crate::github::error::ActivityError;
use crate::github::rate_limit::RateLimitInfo;

use super::{GraphQlGateway, GraphQlResponse};

const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RESET_WAIT: Duration = Duration::from_secs(3600);
const RESET_GRACE: Duration = Duration::from_secs(1);

/// Blocks the current thread for a duration.
pub trait Sleeper: Send + Sync {
    /// Pause for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How rate-limited requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt before giving up.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later one.
    pub base_delay: Duration,
    /// Ceiling for exponential backoff.
    pub max_delay: Duration,
    /// Ceiling for waits derived from a reported reset time.
    pub max_reset_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_reset_wait: DEFAULT_MAX_RESET_WAIT,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    ///
    /// A reset time in the future wins over exponential backoff.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, rate_limit: Option<&RateLimitInfo>) -> Duration {
        if let Some(wait) = rate_limit.and_then(|info| self.reset_wait(info)) {
            return wait;
        }

        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn reset_wait(&self, info: &RateLimitInfo) -> Option<Duration> {
        let wait = info.wait_until_reset();
        if wait.is_zero() {
            return None;
        }
        Some(wait.saturating_add(RESET_GRACE).min(self.max_reset_wait))
    }
}

/// Gateway decorator that retries rate-limited requests and pauses before
/// a request that would exhaust the remaining quota.
#[derive(Debug)]
pub struct RetryingGateway<G, S = ThreadSleeper> {
    inner: G,
    policy: RetryPolicy,
    sleeper: S,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl<G: GraphQlGateway> RetryingGateway<G, ThreadSleeper> {
    /// Wraps `inner` with the given policy, sleeping on the current thread.
    #[must_use]
    pub const fn new(inner: G, policy: RetryPolicy) -> Self {
        Self::with_sleeper(inner, policy, ThreadSleeper)
    }
}

impl<G: GraphQlGateway, S: Sleeper> RetryingGateway<G, S> {
    /// Wraps `inner` with a custom sleeper.
    #[must_use]
    pub const fn with_sleeper(inner: G, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            inner,
            policy,
            sleeper,
            last_rate_limit: Mutex::new(None),
        }
    }

    /// Most recent quota snapshot seen by this gateway.
    #[must_use]
    pub fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        self.last_rate_limit.lock().ok().and_then(|guard| *guard)
    }

    fn remember(&self, rate_limit: Option<RateLimitInfo>) {
        if rate_limit.is_none() {
            return;
        }
        if let Ok(mut guard) = self.last_rate_limit.lock() {
            *guard = rate_limit;
        }
    }

    fn wait_for_quota(&self) {
        let Some(info) = self.last_rate_limit() else {
            return;
        };
        if !info.next_request_would_exhaust() {
            return;
        }
        let Some(wait) = self.policy.reset_wait(&info) else {
            return;
        };

        info!(
            remaining = info.remaining(),
            cost = info.cost().unwrap_or(1),
            wait_secs = wait.as_secs(),
            "rate limit nearly exhausted; waiting for reset"
        );
        self.sleeper.sleep(wait);
        if let Ok(mut guard) = self.last_rate_limit.lock() {
            *guard = None;
        }
    }
}

impl<G: GraphQlGateway, S: Sleeper> GraphQlGateway for RetryingGateway<G, S> {
    fn execute(&self, query: &str) -> Result<GraphQlResponse, ActivityError> {
        self.wait_for_quota();

        let mut attempt = 0;
        loop {
            match self.inner.execute(query) {
                Ok(response) => {
                    self.remember(response.rate_limit);
                    return Ok(response);
                }
                Err(ActivityError::RateLimitExceeded {
                    rate_limit,
                    message,
                }) => {
                    self.remember(rate_limit);
                    if attempt >= self.policy.max_retries {
                        return Err(ActivityError::RateLimitExceeded {
                            rate_limit,
                            message: format!("{message} (gave up after {attempt} retries)"),
                        });
                    }

                    let delay = self.policy.delay_for(attempt, rate_limit.as_ref());
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "rate limited; backing off"
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

//! Rate limit information from GitHub API responses.
//!
//! GitHub reports quota in two places: the `X-RateLimit-*` response headers
//! and, for GraphQL, an optional `rateLimit` selection in the query itself.
//! Every catalog query requests that selection so the retrying gateway can
//! pause before the quota runs dry instead of after.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::DateTime;
use http::HeaderMap;
use serde_json::Value;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit information extracted from a GitHub response.
///
/// # Example
///
/// ```
/// use org_activity::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 4999, 1700000000);
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), 4999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum points allowed in the current window.
    limit: u32,
    /// Remaining points in the current window.
    remaining: u32,
    /// Unix timestamp when the rate limit resets.
    reset_at: u64,
    /// Points charged for the request that produced this snapshot.
    cost: Option<u32>,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
            cost: None,
        }
    }

    /// Records the cost of the request that produced this snapshot.
    #[must_use]
    pub const fn with_cost(mut self, cost: u32) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Reads the `X-RateLimit-*` headers.
    ///
    /// Returns `None` unless all three headers are present and numeric.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
        };

        let limit = u32::try_from(read(LIMIT_HEADER)?).ok()?;
        let remaining = u32::try_from(read(REMAINING_HEADER)?).ok()?;
        let reset_at = read(RESET_HEADER)?;
        Some(Self::new(limit, remaining, reset_at))
    }

    /// Reads a GraphQL `rateLimit { limit cost remaining resetAt }` object.
    #[must_use]
    pub fn from_graphql(value: &Value) -> Option<Self> {
        let read = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_u64)
                .and_then(|raw| u32::try_from(raw).ok())
        };

        let limit = read("limit")?;
        let remaining = read("remaining")?;
        let reset_at = value
            .get("resetAt")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .and_then(|instant| u64::try_from(instant.timestamp()).ok())?;

        let info = Self::new(limit, remaining, reset_at);
        Some(match read("cost") {
            Some(cost) => info.with_cost(cost),
            None => info,
        })
    }

    /// Returns the maximum points allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining points in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the rate limit resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns the cost of the request that produced this snapshot, if known.
    #[must_use]
    pub const fn cost(&self) -> Option<u32> {
        self.cost
    }

    /// Returns true if the rate limit has been exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Returns true when another request of the same cost would not fit in the
    /// remaining quota.
    #[must_use]
    pub fn next_request_would_exhaust(&self) -> bool {
        let cost = self.cost.unwrap_or(1);
        self.remaining <= cost
    }

    /// Calculates seconds until the rate limit resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system time
    /// cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_at.saturating_sub(now)
    }

    /// Time to wait before the quota refills.
    #[must_use]
    pub fn wait_until_reset(&self) -> Duration {
        Duration::from_secs(self.seconds_until_reset())
    }
}

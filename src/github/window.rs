//! Date-window pagination around the search result cap.
//!
//! The search API never returns more than [`SEARCH_RESULT_CAP`] results for
//! one query. [`WindowPaginator::fetch_all`] walks the requested range in
//! windows, and whenever a window comes back truncated it retries the same
//! start with a window a third the size. Windows never overlap: every window
//! but the last ends one second before the next one starts, so an event at a
//! boundary instant is fetched exactly once.

use std::num::NonZeroU32;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::{info, warn};

use super::date_range::{DateRange, format_timestamp};
use super::error::ActivityError;
use super::executor::{QueryExecutor, SEARCH_RESULT_CAP};
use super::gateway::GraphQlGateway;
use super::locator::OrganisationLogin;
use super::queries::QueryDescriptor;

/// Window size the walk starts with.
pub const DEFAULT_INITIAL_WINDOW: TimeDelta = TimeDelta::days(180);

/// Narrowest window tried before giving up on a dense period.
pub const DEFAULT_MIN_WINDOW: TimeDelta = TimeDelta::days(1);

/// Divisor applied to a window that came back truncated.
pub const SHRINK_FACTOR: i32 = 3;

const BOUNDARY_STEP: TimeDelta = TimeDelta::seconds(1);

/// Window sizing rules for [`WindowPaginator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    initial: TimeDelta,
    minimum: TimeDelta,
    regrow_after: Option<NonZeroU32>,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_WINDOW,
            minimum: DEFAULT_MIN_WINDOW,
            regrow_after: None,
        }
    }
}

impl WindowPolicy {
    /// Creates a policy starting at `initial` and never going below `minimum`.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidPagination`] when `minimum` is under one
    /// second or `initial` is smaller than `minimum`.
    pub fn new(initial: TimeDelta, minimum: TimeDelta) -> Result<Self, ActivityError> {
        if minimum < BOUNDARY_STEP {
            return Err(ActivityError::InvalidPagination {
                message: format!(
                    "minimum window must be at least one second, got {}s",
                    minimum.num_seconds()
                ),
            });
        }
        if initial < minimum {
            return Err(ActivityError::InvalidPagination {
                message: format!(
                    "initial window ({}s) must not be smaller than the minimum window ({}s)",
                    initial.num_seconds(),
                    minimum.num_seconds()
                ),
            });
        }
        Ok(Self {
            initial,
            minimum,
            regrow_after: None,
        })
    }

    /// Grows the window back by [`SHRINK_FACTOR`], up to the initial size,
    /// after this many consecutive untruncated windows. `None` keeps a shrunk
    /// window for the rest of the walk.
    #[must_use]
    pub const fn with_regrow_after(mut self, regrow_after: Option<NonZeroU32>) -> Self {
        self.regrow_after = regrow_after;
        self
    }

    /// Starting window size.
    #[must_use]
    pub const fn initial(&self) -> TimeDelta {
        self.initial
    }

    /// Smallest window size.
    #[must_use]
    pub const fn minimum(&self) -> TimeDelta {
        self.minimum
    }

    /// Streak of untruncated windows that triggers regrowth, if enabled.
    #[must_use]
    pub const fn regrow_after(&self) -> Option<NonZeroU32> {
        self.regrow_after
    }

    fn shrink(&self, size: TimeDelta) -> TimeDelta {
        size.checked_div(SHRINK_FACTOR)
            .unwrap_or(self.minimum)
            .max(self.minimum)
    }

    fn grow(&self, size: TimeDelta) -> TimeDelta {
        size.checked_mul(SHRINK_FACTOR)
            .unwrap_or(self.initial)
            .min(self.initial)
    }
}

/// Counters describing how much work a collection took.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// GraphQL requests issued, including retried windows.
    pub requests: usize,
    /// Windows queried, including the ones that came back truncated.
    pub windows_attempted: usize,
    /// Windows that hit the result cap and were retried narrower.
    pub truncated_windows: Vec<DateRange>,
    /// Nodes dropped because they could not be normalised.
    pub skipped_nodes: usize,
}

impl FetchStats {
    /// Number of windows that had to be re-queried at a smaller size.
    #[must_use]
    pub fn window_retries(&self) -> usize {
        self.truncated_windows.len()
    }

    pub(crate) fn absorb(&mut self, other: Self) {
        self.requests += other.requests;
        self.windows_attempted += other.windows_attempted;
        self.truncated_windows.extend(other.truncated_windows);
        self.skipped_nodes += other.skipped_nodes;
    }
}

/// Raw nodes for a whole range plus the work it took to get them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowedFetch {
    /// Nodes in window order, upstream order within each window.
    pub nodes: Vec<Value>,
    /// Request and window counters.
    pub stats: FetchStats,
}

/// Drives a [`QueryExecutor`] across a date range in cap-safe windows.
#[derive(Debug)]
pub struct WindowPaginator<'executor, 'client, Gateway>
where
    Gateway: GraphQlGateway,
{
    executor: &'executor QueryExecutor<'client, Gateway>,
    policy: WindowPolicy,
}

impl<'executor, 'client, Gateway> WindowPaginator<'executor, 'client, Gateway>
where
    Gateway: GraphQlGateway,
{
    /// Create a paginator around an executor.
    #[must_use]
    pub const fn new(
        executor: &'executor QueryExecutor<'client, Gateway>,
        policy: WindowPolicy,
    ) -> Self {
        Self { executor, policy }
    }

    /// Fetches every node of `descriptor` for `org` across `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::NonConvergence`] when a window at the minimum
    /// size still hits the cap, [`ActivityError::Cancelled`] when the
    /// executor's token is cancelled, and any gateway failure.
    pub fn fetch_all(
        &self,
        descriptor: &QueryDescriptor,
        org: &OrganisationLogin,
        range: &DateRange,
    ) -> Result<WindowedFetch, ActivityError> {
        let until = range.until();
        let mut start = range.since();
        let mut size = self.policy.initial;
        let mut streak = 0_u32;
        let mut fetched = WindowedFetch::default();

        while start < until {
            self.executor.cancellation().check()?;

            let (end, window) = next_window(start, size, until);
            fetched.stats.windows_attempted += 1;

            let page_set = self.executor.run_page(descriptor, org, &window)?;
            fetched.stats.requests += page_set.requests;

            if page_set.truncated {
                fetched.stats.truncated_windows.push(window);
                let attempted = end - start;
                if attempted <= self.policy.minimum {
                    return Err(ActivityError::NonConvergence {
                        window_start: format_timestamp(start),
                        window_seconds: attempted.num_seconds(),
                        cap: SEARCH_RESULT_CAP,
                    });
                }
                size = self.policy.shrink(attempted);
                streak = 0;
                warn!(
                    activity = descriptor.name(),
                    %window,
                    next_window_secs = size.num_seconds(),
                    "window hit the search cap; narrowing"
                );
                continue;
            }

            info!(
                activity = descriptor.name(),
                %window,
                nodes = page_set.nodes.len(),
                "window complete"
            );
            fetched.nodes.extend(page_set.nodes);
            start = end;

            if let Some(threshold) = self.policy.regrow_after {
                streak += 1;
                if streak >= threshold.get() && size < self.policy.initial {
                    size = self.policy.grow(size);
                    streak = 0;
                }
            }
        }

        Ok(fetched)
    }
}

/// Picks the window beginning at `start`.
///
/// Returns where the next window starts and the inclusive range to query.
/// Only the final window includes its own end instant.
fn next_window(
    start: DateTime<Utc>,
    size: TimeDelta,
    until: DateTime<Utc>,
) -> (DateTime<Utc>, DateRange) {
    match start.checked_add_signed(size) {
        Some(end) if end < until => (end, DateRange::window(start, end - BOUNDARY_STEP)),
        _ => (until, DateRange::window(start, until)),
    }
}

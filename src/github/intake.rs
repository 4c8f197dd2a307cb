//! High-level collection facade used by the CLI.
//!
//! [`ActivityIntake`] ties the catalog, executor, paginator, and normaliser
//! together: one full-range pass first, and a windowed walk only when that
//! pass hits the search cap.

use serde_json::Value;
use tracing::{info, warn};

use super::cancel::CancellationToken;
use super::date_range::DateRange;
use super::error::ActivityError;
use super::executor::{DEFAULT_PAGE_SIZE, QueryExecutor};
use super::gateway::GraphQlGateway;
use super::locator::OrganisationLogin;
use super::normalize::{CanonicalEvent, normalize};
use super::queries::{ActivityKind, organisation_probe_query};
use super::window::{FetchStats, WindowPaginator, WindowPolicy};

/// Events for one activity kind plus the work it took to collect them.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityReport {
    /// Activity kind that was collected.
    pub kind: ActivityKind,
    /// Normalised events in collection order.
    pub events: Vec<CanonicalEvent>,
    /// Request, window, and skip counters.
    pub stats: FetchStats,
}

/// Collects organisation activity using a gateway.
pub struct ActivityIntake<'client, Gateway>
where
    Gateway: GraphQlGateway,
{
    client: &'client Gateway,
    page_size: u8,
    window_policy: WindowPolicy,
    cancellation: CancellationToken,
}

impl<'client, Gateway> ActivityIntake<'client, Gateway>
where
    Gateway: GraphQlGateway,
{
    /// Create a new intake facade using the provided gateway.
    #[must_use]
    pub fn new(client: &'client Gateway) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
            window_policy: WindowPolicy::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Overrides the number of nodes requested per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size;
        self
    }

    /// Overrides window sizing for truncated ranges.
    #[must_use]
    pub const fn with_window_policy(mut self, policy: WindowPolicy) -> Self {
        self.window_policy = policy;
        self
    }

    /// Stops collection between requests once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Collects and normalises every event of `kind` for `org` in `range`.
    ///
    /// Nodes that cannot be normalised are skipped with a warning and counted
    /// in [`FetchStats::skipped_nodes`].
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidPagination`] for an out-of-range page
    /// size, [`ActivityError::NonConvergence`] when windowing cannot get
    /// below the search cap, and any gateway or cancellation failure.
    pub fn collect(
        &self,
        org: &OrganisationLogin,
        kind: ActivityKind,
        range: &DateRange,
    ) -> Result<ActivityReport, ActivityError> {
        let descriptor = kind.descriptor();
        let executor = QueryExecutor::new(self.client)
            .with_page_size(self.page_size)?
            .with_cancellation(self.cancellation.clone());

        let full_range = executor.run_page(descriptor, org, range)?;
        let mut stats = FetchStats {
            requests: full_range.requests,
            windows_attempted: 1,
            ..FetchStats::default()
        };

        let nodes = if full_range.truncated {
            warn!(
                org = org.as_str(),
                activity = %kind,
                %range,
                "full range hit the search cap; switching to windowed collection"
            );
            stats.truncated_windows.push(*range);
            let fetched = WindowPaginator::new(&executor, self.window_policy)
                .fetch_all(descriptor, org, range)?;
            stats.absorb(fetched.stats);
            fetched.nodes
        } else {
            full_range.nodes
        };

        let events = normalize_all(kind, &nodes, &mut stats);

        info!(
            org = org.as_str(),
            activity = %kind,
            %range,
            events = events.len(),
            requests = stats.requests,
            windows = stats.windows_attempted,
            window_retries = stats.window_retries(),
            skipped = stats.skipped_nodes,
            "collection complete"
        );

        Ok(ActivityReport {
            kind,
            events,
            stats,
        })
    }

    /// Collects every catalog kind for `org`, one after another.
    ///
    /// # Errors
    ///
    /// Stops at the first kind that fails and returns its error.
    pub fn collect_all(
        &self,
        org: &OrganisationLogin,
        range: &DateRange,
    ) -> Result<Vec<ActivityReport>, ActivityError> {
        ActivityKind::ALL
            .into_iter()
            .map(|kind| self.collect(org, kind, range))
            .collect()
    }

    /// Returns whether GitHub resolves `org` to an organisation.
    ///
    /// # Errors
    ///
    /// Propagates authentication, network, and rate-limit failures; an
    /// unknown organisation is `Ok(false)`.
    pub fn validate_organisation(&self, org: &OrganisationLogin) -> Result<bool, ActivityError> {
        self.cancellation.check()?;
        let response = self.client.execute(&organisation_probe_query(org))?;
        let exists = response
            .data
            .as_ref()
            .and_then(|data| data.pointer("/organization/login"))
            .and_then(Value::as_str)
            .is_some();

        info!(org = org.as_str(), exists, "organisation lookup");
        Ok(exists)
    }
}

fn normalize_all(
    kind: ActivityKind,
    nodes: &[Value],
    stats: &mut FetchStats,
) -> Vec<CanonicalEvent> {
    let descriptor = kind.descriptor();
    let mut events = Vec::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        match normalize(descriptor, node) {
            Ok(event) => events.push(event),
            Err(error) => {
                stats.skipped_nodes += 1;
                warn!(activity = %kind, position, %error, "skipping node");
            }
        }
    }
    events
}

//! Cursor-following execution of one catalog query over one window.

use serde_json::Value;
use tracing::{debug, warn};

use super::cancel::CancellationToken;
use super::date_range::DateRange;
use super::error::ActivityError;
use super::gateway::GraphQlGateway;
use super::locator::OrganisationLogin;
use super::pagination::extract_page;
use super::queries::{MAX_PAGE_SIZE, QueryDescriptor, QueryParams};

/// Hard ceiling on results the search API returns for one query.
pub const SEARCH_RESULT_CAP: usize = 1000;

/// Page size used unless the caller overrides it.
pub const DEFAULT_PAGE_SIZE: u8 = MAX_PAGE_SIZE;

/// Every node returned for one window, in upstream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSet {
    /// Raw result nodes.
    pub nodes: Vec<Value>,
    /// True when the node count reached [`SEARCH_RESULT_CAP`], meaning more
    /// matches may exist than were returned.
    pub truncated: bool,
    /// GraphQL requests issued.
    pub requests: usize,
}

/// Runs a catalog query page by page until the upstream reports no next page.
#[derive(Debug)]
pub struct QueryExecutor<'client, Gateway>
where
    Gateway: GraphQlGateway,
{
    client: &'client Gateway,
    page_size: u8,
    cancellation: CancellationToken,
}

impl<'client, Gateway> QueryExecutor<'client, Gateway>
where
    Gateway: GraphQlGateway,
{
    /// Create an executor using the provided gateway.
    #[must_use]
    pub fn new(client: &'client Gateway) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
            cancellation: CancellationToken::new(),
        }
    }

    /// Overrides the number of nodes requested per page.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidPagination`] unless
    /// `1 <= page_size <= 100`.
    pub fn with_page_size(mut self, page_size: u8) -> Result<Self, ActivityError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ActivityError::InvalidPagination {
                message: format!(
                    "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
                ),
            });
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Checks `token` before every request.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Cancellation token consulted between requests.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fetches every page of `descriptor` for `org` inside `window`.
    ///
    /// A response without a `pageInfo`-bearing object (unknown organisation,
    /// `search: null`) ends iteration and contributes no nodes.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures and returns [`ActivityError::Cancelled`]
    /// when cancellation is requested between pages.
    pub fn run_page(
        &self,
        descriptor: &QueryDescriptor,
        org: &OrganisationLogin,
        window: &DateRange,
    ) -> Result<PageSet, ActivityError> {
        let mut nodes = Vec::new();
        let mut requests = 0_usize;
        let mut cursor: Option<String> = None;

        loop {
            self.cancellation.check()?;

            let query = descriptor.build(&QueryParams {
                org,
                page_size: self.page_size,
                cursor: cursor.as_deref(),
                window,
            });
            let response = self.client.execute(&query)?;
            requests += 1;

            let Some(page) = response.data.as_ref().and_then(extract_page) else {
                debug!(
                    activity = descriptor.name(),
                    %window,
                    "response carried no connection; treating as empty"
                );
                break;
            };

            debug!(
                activity = descriptor.name(),
                %window,
                page = requests,
                items = page.items.len(),
                has_next_page = page.page_info.has_next_page(),
                "fetched page"
            );
            nodes.extend(page.items);

            let next = page.page_info.next_cursor().map(ToOwned::to_owned);
            match next {
                Some(next_cursor) if cursor.as_deref() == Some(next_cursor.as_str()) => {
                    warn!(
                        activity = descriptor.name(),
                        cursor = %next_cursor,
                        "upstream repeated the previous cursor; stopping"
                    );
                    break;
                }
                Some(next_cursor) => cursor = Some(next_cursor),
                None => {
                    if page.page_info.has_next_page() {
                        warn!(
                            activity = descriptor.name(),
                            "hasNextPage without endCursor; stopping"
                        );
                    }
                    break;
                }
            }
        }

        let truncated = nodes.len() >= SEARCH_RESULT_CAP;
        Ok(PageSet {
            nodes,
            truncated,
            requests,
        })
    }
}

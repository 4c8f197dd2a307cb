//! GitHub organisation activity collection over the GraphQL search API.
//!
//! The pieces compose bottom-up: [`queries`] renders catalog searches,
//! [`QueryExecutor`] follows cursors for one date window, [`WindowPaginator`]
//! splits a range into windows small enough to stay under the search cap,
//! and [`normalize`] maps raw nodes onto [`CanonicalEvent`]s. [`ActivityIntake`]
//! ties them together for callers.

pub mod cancel;
pub mod date_range;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod intake;
pub mod locator;
pub mod normalize;
pub mod pagination;
pub mod queries;
pub mod rate_limit;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod window;

pub use cancel::CancellationToken;
pub use date_range::DateRange;
pub use error::ActivityError;
pub use executor::{PageSet, QueryExecutor, SEARCH_RESULT_CAP};
pub use gateway::{
    GraphQlGateway, GraphQlResponse, HttpGatewayConfig, HttpGraphQlGateway, RetryPolicy,
    RetryingGateway, Sleeper, ThreadSleeper,
};
pub use intake::{ActivityIntake, ActivityReport};
pub use locator::{GraphQlEndpoint, OrganisationLogin, PersonalAccessToken};
pub use normalize::{CanonicalEvent, EventDetails};
pub use queries::{ActivityKind, QueryDescriptor};
pub use rate_limit::RateLimitInfo;
pub use window::{FetchStats, WindowPaginator, WindowPolicy, WindowedFetch};

#[cfg(test)]
pub use gateway::MockGraphQlGateway;

//! Gateways for sending GraphQL documents to GitHub.
//!
//! The trait-based design lets the executor and paginator run against a mock
//! in tests, while [`HttpGraphQlGateway`] performs real blocking HTTP requests
//! and [`RetryingGateway`] layers rate-limit backoff on top of any gateway.

mod client;
mod error_mapping;
mod retrying;

pub use client::{HttpGatewayConfig, HttpGraphQlGateway};
pub use retrying::{RetryPolicy, RetryingGateway, Sleeper, ThreadSleeper};

use serde_json::Value;

use crate::github::error::ActivityError;
use crate::github::rate_limit::RateLimitInfo;

/// Decoded body of a successful GraphQL call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphQlResponse {
    /// The `data` member, `None` when GitHub answered `null` or reported the
    /// requested entity as missing.
    pub data: Option<Value>,
    /// Quota snapshot from the `rateLimit` selection or response headers.
    pub rate_limit: Option<RateLimitInfo>,
}

impl GraphQlResponse {
    /// Wraps a `data` value, reading quota from its `rateLimit` member.
    #[must_use]
    pub fn from_data(data: Value) -> Self {
        let rate_limit = data.get("rateLimit").and_then(RateLimitInfo::from_graphql);
        Self {
            data: Some(data),
            rate_limit,
        }
    }
}

/// Gateway that can execute a GraphQL document.
#[cfg_attr(test, mockall::automock)]
pub trait GraphQlGateway: Send + Sync {
    /// Send one query and return its decoded `data`.
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, rate-limit, and GraphQL failures as
    /// [`ActivityError`] variants.
    fn execute(&self, query: &str) -> Result<GraphQlResponse, ActivityError>;
}

impl<G: GraphQlGateway + ?Sized> GraphQlGateway for &G {
    fn execute(&self, query: &str) -> Result<GraphQlResponse, ActivityError> {
        (**self).execute(query)
    }
}

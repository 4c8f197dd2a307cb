//! Error types exposed by the activity collection layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while validating input, talking to GitHub, or windowing a
/// date range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivityError {
    /// No organisation login was supplied.
    #[error("organisation login is required")]
    MissingOrganisation,

    /// The organisation login contains characters GitHub does not allow.
    #[error("organisation login is invalid: {login}")]
    InvalidOrganisation {
        /// The rejected login.
        login: String,
    },

    /// GitHub does not know the organisation.
    #[error("organisation not found: {login}")]
    OrganisationNotFound {
        /// The login that did not resolve.
        login: String,
    },

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// The configured API URL could not be parsed.
    #[error("API URL is invalid: {0}")]
    InvalidUrl(String),

    /// The requested date range is unusable.
    #[error("invalid date range: {message}")]
    InvalidDateRange {
        /// Why the range was rejected.
        message: String,
    },

    /// The requested activity kind is not in the query catalog.
    #[error("unknown activity kind: {name}")]
    UnknownActivityKind {
        /// Name or index supplied by the caller.
        name: String,
    },

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication HTTP error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// GitHub answered with a GraphQL `errors` array and no usable data.
    #[error("GitHub GraphQL error: {message}")]
    GraphQl {
        /// Joined messages from the `errors` array.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode GitHub response: {message}")]
    Decode {
        /// Decoder error detail.
        message: String,
    },

    /// Rate limit exceeded and retries were exhausted.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from the response.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// A raw result node could not be normalised into an event.
    #[error("malformed result node: {message}")]
    MalformedNode {
        /// What was wrong with the node.
        message: String,
    },

    /// The search cap was still hit at the smallest allowed window.
    #[error(
        "window starting {window_start} still returns the full {cap} results at the minimum \
         window of {window_seconds}s; events would be lost"
    )]
    NonConvergence {
        /// Start of the window that could not be narrowed further.
        window_start: String,
        /// Width of that window in seconds.
        window_seconds: i64,
        /// Result cap that kept being hit.
        cap: usize,
    },

    /// The run was cancelled between requests.
    #[error("activity collection was cancelled")]
    Cancelled,

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}

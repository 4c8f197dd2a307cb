//! Organisation activity collection from GitHub's GraphQL search API.
//!
//! The library renders catalog search queries, follows cursor pagination,
//! splits long date ranges into windows that stay under GitHub's
//! 1000-result search cap, and normalises every result node into a
//! [`CanonicalEvent`]. Configuration, rate-limit handling, and JSONL export
//! support the `org-activity` binary.

pub mod config;
pub mod export;
pub mod github;

pub use config::OrgActivityConfig;
pub use github::{
    ActivityError, ActivityIntake, ActivityKind, ActivityReport, CanonicalEvent, DateRange,
    GraphQlGateway, GraphQlResponse, HttpGraphQlGateway, OrganisationLogin, PersonalAccessToken,
    RetryingGateway, WindowPolicy,
};

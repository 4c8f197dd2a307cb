//! Blocking HTTP implementation of [`GraphQlGateway`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::github::error::ActivityError;
use crate::github::locator::{GraphQlEndpoint, PersonalAccessToken};
use crate::github::rate_limit::RateLimitInfo;

use super::error_mapping::{
    GraphQlErrorKind, classify_graphql_errors, map_http_error, map_transport_error,
    truncate_for_message,
};
use super::{GraphQlGateway, GraphQlResponse};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("org-activity/", env!("CARGO_PKG_VERSION"));
const OPERATION: &str = "GraphQL request";

/// Settings for [`HttpGraphQlGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGatewayConfig {
    /// Resolved GraphQL endpoint.
    pub endpoint: GraphQlEndpoint,
    /// HTTP timeout per request.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl HttpGatewayConfig {
    /// Constructs configuration for an endpoint with default timeout and
    /// user agent.
    #[must_use]
    pub fn new(endpoint: GraphQlEndpoint) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gateway that POSTs GraphQL documents with a personal access token.
#[derive(Debug, Clone)]
pub struct HttpGraphQlGateway {
    client: Client,
    endpoint: GraphQlEndpoint,
    authorization: String,
}

impl HttpGraphQlGateway {
    /// Builds a gateway for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Configuration`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        token: &PersonalAccessToken,
        config: HttpGatewayConfig,
    ) -> Result<Self, ActivityError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|error| ActivityError::Configuration {
                message: format!("failed to configure GitHub HTTP client: {error}"),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            authorization: token.authorization_header(),
        })
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &GraphQlEndpoint {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

impl GraphQlGateway for HttpGraphQlGateway {
    fn execute(&self, query: &str) -> Result<GraphQlResponse, ActivityError> {
        let response = self
            .client
            .post(self.endpoint.url().clone())
            .header(AUTHORIZATION, self.authorization.as_str())
            .header(ACCEPT, "application/json")
            .json(&GraphQlRequest { query })
            .send()
            .map_err(|error| map_transport_error(OPERATION, &error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .map_err(|error| map_transport_error(OPERATION, &error))?;

        if !status.is_success() {
            return Err(map_http_error(OPERATION, status, &headers, &body));
        }

        let header_rate_limit = RateLimitInfo::from_headers(&headers);
        let mut decoded = decode_body(&body)?;
        if decoded.rate_limit.is_none() {
            decoded.rate_limit = header_rate_limit;
        }
        Ok(decoded)
    }
}

/// Interprets a 2xx body, including the GraphQL `errors` member.
fn decode_body(body: &str) -> Result<GraphQlResponse, ActivityError> {
    let value: Value = serde_json::from_str(body).map_err(|error| ActivityError::Decode {
        message: format!(
            "{error} (body: {})",
            truncate_for_message(body, 160)
        ),
    })?;

    let data = value.get("data").filter(|data| !data.is_null()).cloned();
    let errors = value
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty());

    let Some(entries) = errors else {
        return Ok(data.map(GraphQlResponse::from_data).unwrap_or_default());
    };

    match classify_graphql_errors(entries) {
        GraphQlErrorKind::NotFound => {
            let rate_limit = data
                .as_ref()
                .and_then(|present| present.get("rateLimit"))
                .and_then(RateLimitInfo::from_graphql);
            Ok(GraphQlResponse {
                data: None,
                rate_limit,
            })
        }
        GraphQlErrorKind::RateLimited(message) => Err(ActivityError::RateLimitExceeded {
            rate_limit: data
                .as_ref()
                .and_then(|present| present.get("rateLimit"))
                .and_then(RateLimitInfo::from_graphql),
            message,
        }),
        GraphQlErrorKind::Other(message) => match data {
            Some(present) => {
                warn!(%message, "GraphQL response carried errors alongside data");
                Ok(GraphQlResponse::from_data(present))
            }
            None => Err(ActivityError::GraphQl { message }),
        },
    }
}

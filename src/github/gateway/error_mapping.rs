//! Error mapping helpers for the HTTP GraphQL gateway.

use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::github::error::ActivityError;
use crate::github::rate_limit::RateLimitInfo;

const MAX_MESSAGE_CHARS: usize = 160;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks whether an HTTP failure is a rate limit rather than a permission
/// problem.
///
/// 429 always is. GitHub also answers 403 for primary and secondary limits,
/// which is distinguished by an exhausted quota header or by the message and
/// documentation URL in the body.
pub(super) fn is_rate_limit_response(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    if status != StatusCode::FORBIDDEN {
        return false;
    }

    let quota_exhausted =
        RateLimitInfo::from_headers(headers).is_some_and(|info| info.is_exhausted());
    let retry_after = headers.contains_key(http::header::RETRY_AFTER);

    let parsed = serde_json::from_str::<Value>(body).ok();
    let message_indicates_rate_limit = parsed
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .is_some_and(|message| message.to_lowercase().contains("rate limit"));
    let documentation_indicates_rate_limit = parsed
        .as_ref()
        .and_then(|value| value.get("documentation_url"))
        .and_then(Value::as_str)
        .is_some_and(|url| url.contains("rate-limit"));

    quota_exhausted
        || retry_after
        || message_indicates_rate_limit
        || documentation_indicates_rate_limit
}

/// Maps a non-success HTTP response into an [`ActivityError`].
pub(super) fn map_http_error(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ActivityError {
    let message = extract_github_message(body)
        .unwrap_or_else(|| truncate_for_message(body, MAX_MESSAGE_CHARS));

    if is_rate_limit_response(status, headers, body) {
        return ActivityError::RateLimitExceeded {
            rate_limit: RateLimitInfo::from_headers(headers),
            message: format!("{operation} failed: GitHub returned {status} {message}"),
        };
    }

    if is_auth_failure(status) {
        ActivityError::Authentication {
            message: format!("{operation} failed: GitHub returned {status} {message}"),
        }
    } else {
        ActivityError::Api {
            message: format!("{operation} failed with status {status}: {message}"),
        }
    }
}

/// Maps a transport failure from the HTTP client.
pub(super) fn map_transport_error(operation: &str, error: &reqwest::Error) -> ActivityError {
    ActivityError::Network {
        message: format!("{operation} failed: {error}"),
    }
}

/// How a GraphQL `errors` array should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum GraphQlErrorKind {
    /// Every error reports a missing entity.
    NotFound,
    /// At least one error reports an exhausted quota.
    RateLimited(String),
    /// Anything else.
    Other(String),
}

/// Classifies the entries of a GraphQL `errors` array.
pub(super) fn classify_graphql_errors(errors: &[Value]) -> GraphQlErrorKind {
    let error_type = |error: &Value| {
        error
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_ascii_uppercase)
    };
    let message = join_messages(errors);

    if errors
        .iter()
        .any(|error| error_type(error).as_deref() == Some("RATE_LIMITED"))
    {
        return GraphQlErrorKind::RateLimited(message);
    }

    if !errors.is_empty()
        && errors
            .iter()
            .all(|error| error_type(error).as_deref() == Some("NOT_FOUND"))
    {
        return GraphQlErrorKind::NotFound;
    }

    GraphQlErrorKind::Other(message)
}

fn join_messages(errors: &[Value]) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|error| error.get("message").and_then(Value::as_str))
        .collect();
    if messages.is_empty() {
        "unspecified GraphQL error".to_owned()
    } else {
        messages.join("; ")
    }
}

fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

pub(super) fn truncate_for_message(value: &str, max_chars: usize) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_owned();
    }
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_owned();
    }
    let truncated: String = trimmed.chars().take(max_chars).collect();
    format!("{truncated}...")
}

//! In-memory search upstream for exercising pagination and windowing.
//!
//! [`FakeSearchGateway`] reads the date window, page size, and cursor back
//! out of each rendered query and answers like the search API would: results
//! in the window, at most [`SEARCH_RESULT_CAP`] of them, served in pages.

use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};

use super::date_range::{DateRange, format_timestamp};
use super::error::ActivityError;
use super::executor::SEARCH_RESULT_CAP;
use super::gateway::{GraphQlGateway, GraphQlResponse};

const TIMESTAMP_LEN: usize = "2023-01-01T00:00:00Z".len();

type NodeSource = dyn Fn(&DateRange) -> Vec<Value> + Send + Sync;

/// Fake GraphQL gateway answering catalog search queries.
pub struct FakeSearchGateway {
    source: Box<NodeSource>,
    requests: Mutex<Vec<(DateRange, Option<usize>)>>,
}

impl std::fmt::Debug for FakeSearchGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FakeSearchGateway")
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl FakeSearchGateway {
    /// Answers each window with whatever `source` returns for it, capped.
    #[must_use]
    pub fn new(source: impl Fn(&DateRange) -> Vec<Value> + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers with one merged pull request per timestamp, inclusive of both
    /// window ends, in ascending time order.
    #[must_use]
    pub fn from_timestamps(timestamps: Vec<DateTime<Utc>>) -> Self {
        let mut sorted = timestamps;
        sorted.sort_unstable();
        Self::new(move |window| {
            sorted
                .iter()
                .enumerate()
                .filter(|(_, instant)| window.since() <= **instant && **instant <= window.until())
                .map(|(index, instant)| merged_pull_request_node(index, *instant))
                .collect()
        })
    }

    /// Number of GraphQL requests answered.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().map_or(0, |requests| requests.len())
    }

    /// Windows of every first-page request, in call order.
    #[must_use]
    pub fn queried_windows(&self) -> Vec<DateRange> {
        self.requests.lock().map_or_else(
            |_| Vec::new(),
            |requests| {
                requests
                    .iter()
                    .filter(|(_, offset)| offset.is_none())
                    .map(|(window, _)| *window)
                    .collect()
            },
        )
    }
}

impl GraphQlGateway for FakeSearchGateway {
    fn execute(&self, query: &str) -> Result<GraphQlResponse, ActivityError> {
        let window = window_from_query(query).ok_or_else(|| ActivityError::GraphQl {
            message: "query carried no date window".to_owned(),
        })?;
        let page_size = argument(query, "first:")
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(100);
        let offset = argument(query, "after:")
            .filter(|raw| *raw != "null")
            .and_then(|raw| raw.trim_matches('"').parse::<usize>().ok());

        if let Ok(mut requests) = self.requests.lock() {
            requests.push((window, offset));
        }

        let mut matching = (self.source)(&window);
        matching.truncate(SEARCH_RESULT_CAP);

        let start = offset.unwrap_or(0).min(matching.len());
        let end = start.saturating_add(page_size).min(matching.len());
        let nodes: Vec<Value> = matching.get(start..end).map(<[Value]>::to_vec).unwrap_or_default();
        let has_next_page = end < matching.len();

        Ok(GraphQlResponse::from_data(json!({
            "search": {
                "pageInfo": {
                    "hasNextPage": has_next_page,
                    "endCursor": if nodes.is_empty() { Value::Null } else { json!(end.to_string()) }
                },
                "nodes": nodes
            }
        })))
    }
}

/// Raw merged pull request node as the search API returns it.
#[must_use]
pub fn merged_pull_request_node(index: usize, merged_at: DateTime<Utc>) -> Value {
    let stamp = format_timestamp(merged_at);
    json!({
        "createdAt": stamp,
        "mergedAt": stamp,
        "mergedBy": { "login": format!("maintainer-{}", index % 7) },
        "author": { "login": format!("author-{}", index % 11) },
        "title": format!("Change #{index}"),
        "repository": { "name": "widgets" },
        "url": format!("https://github.com/octo-org/widgets/pull/{index}")
    })
}

/// `count` instants starting at `first`, `step` apart.
#[must_use]
pub fn spaced_timestamps(
    first: DateTime<Utc>,
    step: TimeDelta,
    count: usize,
) -> Vec<DateTime<Utc>> {
    std::iter::successors(Some(first), |previous| previous.checked_add_signed(step))
        .take(count)
        .collect()
}

fn window_from_query(query: &str) -> Option<DateRange> {
    let separator = query.find("Z..")? + 1;
    let since = query.get(separator.checked_sub(TIMESTAMP_LEN)?..separator)?;
    let until_start = separator + 2;
    let until = query.get(until_start..until_start + TIMESTAMP_LEN)?;
    let parse = |raw: &str| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|instant| instant.with_timezone(&Utc))
    };
    Some(DateRange::window(parse(since)?, parse(until)?))
}

fn argument<'query>(query: &'query str, name: &str) -> Option<&'query str> {
    let start = query.find(name)? + name.len();
    query.get(start..)?.split_whitespace().next()
}

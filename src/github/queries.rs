//! Catalog of search queries for organisation activity.
//!
//! Each [`ActivityKind`] owns one [`QueryDescriptor`]: a search qualifier
//! template, the node selection to request, and the flattened field paths that
//! carry the event timestamp and the contributor login. The set is closed;
//! callers pick a kind by name, slug, or position.

use std::fmt::Write as _;
use std::str::FromStr;

use super::date_range::DateRange;
use super::error::ActivityError;
use super::locator::OrganisationLogin;

/// Largest `first:` value the GraphQL API accepts.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Selection appended to every query so responses report quota usage.
const RATE_LIMIT_SELECTION: &str = "rateLimit { limit cost remaining resetAt }";

const PULL_REQUEST_SELECTION: &str = "\
      ... on PullRequest {
        createdAt
        mergedAt
        mergedBy {
          login
        }
        author {
          login
        }
        title
        repository {
          name
        }
        url
      }";

const ISSUE_SELECTION: &str = "\
      ... on Issue {
        createdAt
        closedAt
        author {
          login
        }
        title
        repository {
          name
        }
        url
        state
        stateReason
      }";

/// Activity types that can be collected for an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// Pull requests merged inside the range.
    MergedPullRequest,
    /// Issues opened inside the range, excluding ones closed as not planned.
    Issue,
    /// Pull requests opened inside the range.
    CreatedPullRequest,
}

impl ActivityKind {
    /// Every kind, in catalog order.
    pub const ALL: [Self; 3] = [Self::MergedPullRequest, Self::Issue, Self::CreatedPullRequest];

    /// Looks a kind up by its catalog position.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Descriptor driving query construction and normalisation.
    #[must_use]
    pub fn descriptor(self) -> &'static QueryDescriptor {
        match self {
            Self::MergedPullRequest => &MERGED_PULL_REQUESTS,
            Self::Issue => &ISSUES,
            Self::CreatedPullRequest => &CREATED_PULL_REQUESTS,
        }
    }

    /// Event type label, e.g. `"merged PR"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.descriptor().name()
    }

    /// Command-line friendly slug, e.g. `"merged-pr"`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::MergedPullRequest => "merged-pr",
            Self::Issue => "issue",
            Self::CreatedPullRequest => "created-pr",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.label())
    }
}

impl FromStr for ActivityKind {
    type Err = ActivityError;

    /// Accepts the label (`merged PR`), the slug (`merged-pr`), or the
    /// catalog index (`0`).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return Self::from_index(index).ok_or_else(|| ActivityError::UnknownActivityKind {
                name: trimmed.to_owned(),
            });
        }

        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.label().eq_ignore_ascii_case(trimmed)
                    || kind.slug().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ActivityError::UnknownActivityKind {
                name: trimmed.to_owned(),
            })
    }
}

/// Inputs for rendering one page of a catalog query.
#[derive(Debug, Clone, Copy)]
pub struct QueryParams<'a> {
    /// Organisation whose activity is searched.
    pub org: &'a OrganisationLogin,
    /// Number of nodes per page, `1..=100`.
    pub page_size: u8,
    /// `endCursor` of the previous page, `None` on the first page.
    pub cursor: Option<&'a str>,
    /// Inclusive window sent in the search qualifier.
    pub window: &'a DateRange,
}

/// Immutable description of one activity query.
#[derive(Debug, PartialEq, Eq)]
pub struct QueryDescriptor {
    name: &'static str,
    qualifiers: &'static str,
    date_qualifier: &'static str,
    selection: &'static str,
    timestamp_field: &'static str,
    contributor_field: &'static str,
}

/// Merged pull requests, timestamped by merge and credited to the merger.
pub static MERGED_PULL_REQUESTS: QueryDescriptor = QueryDescriptor {
    name: "merged PR",
    qualifiers: "is:pr is:merged",
    date_qualifier: "merged",
    selection: PULL_REQUEST_SELECTION,
    timestamp_field: "mergedAt",
    contributor_field: "mergedBy.login",
};

/// Issues, excluding those closed as not planned.
pub static ISSUES: QueryDescriptor = QueryDescriptor {
    name: "issue",
    qualifiers: "is:issue -reason:NOT_PLANNED",
    date_qualifier: "created",
    selection: ISSUE_SELECTION,
    timestamp_field: "createdAt",
    contributor_field: "author.login",
};

/// Pull requests by creation date, credited to the author.
pub static CREATED_PULL_REQUESTS: QueryDescriptor = QueryDescriptor {
    name: "created PR",
    qualifiers: "is:pr",
    date_qualifier: "created",
    selection: PULL_REQUEST_SELECTION,
    timestamp_field: "createdAt",
    contributor_field: "author.login",
};

impl QueryDescriptor {
    /// Activity label used as the event type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Dotted path of the event timestamp in a flattened node.
    #[must_use]
    pub const fn timestamp_field(&self) -> &'static str {
        self.timestamp_field
    }

    /// Dotted path of the contributor login in a flattened node.
    #[must_use]
    pub const fn contributor_field(&self) -> &'static str {
        self.contributor_field
    }

    /// Search string placed in the `query:` argument.
    #[must_use]
    pub fn search_string(&self, org: &OrganisationLogin, window: &DateRange) -> String {
        format!(
            "org:{org} {qualifiers} {date}:{since}..{until}",
            org = org.as_str(),
            qualifiers = self.qualifiers,
            date = self.date_qualifier,
            since = window.since_qualifier(),
            until = window.until_qualifier(),
        )
    }

    /// Renders the GraphQL document for one page.
    ///
    /// The search string and cursor are emitted as escaped string literals;
    /// the first page sends an unquoted `null` cursor.
    #[must_use]
    pub fn build(&self, params: &QueryParams<'_>) -> String {
        let search = self.search_string(params.org, params.window);
        let after = params
            .cursor
            .map_or_else(|| "null".to_owned(), quote_graphql_string);
        let first = params.page_size.clamp(1, MAX_PAGE_SIZE);

        format!(
            "{{
  {RATE_LIMIT_SELECTION}
  search(
    query: {query}
    first: {first}
    after: {after}
    type: ISSUE
  ) {{
    pageInfo {{
      hasNextPage
      endCursor
    }}
    nodes {{
{selection}
    }}
  }}
}}
",
            query = quote_graphql_string(&search),
            selection = self.selection,
        )
    }
}

/// Query that resolves an organisation by login, used to validate input
/// before a long collection run.
#[must_use]
pub fn organisation_probe_query(org: &OrganisationLogin) -> String {
    format!(
        "{{
  {RATE_LIMIT_SELECTION}
  organization(login: {login}) {{
    login
  }}
}}
",
        login = quote_graphql_string(org.as_str())
    )
}

/// Renders `raw` as a GraphQL string literal.
#[must_use]
pub fn quote_graphql_string(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for character in raw.chars() {
        match character {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            control if control.is_control() => {
                let _ignored = write!(quoted, "\\u{:04X}", u32::from(control));
            }
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::{
        ActivityKind, CREATED_PULL_REQUESTS, ISSUES, MERGED_PULL_REQUESTS, QueryParams,
        organisation_probe_query, quote_graphql_string,
    };
    use crate::github::date_range::DateRange;
    use crate::github::error::ActivityError;
    use crate::github::locator::OrganisationLogin;

    #[fixture]
    fn org() -> OrganisationLogin {
        OrganisationLogin::new("octo-org").expect("login should be valid")
    }

    #[fixture]
    fn window() -> DateRange {
        DateRange::parse("2023-01-01T00:00:00Z", "2023-01-10T00:00:00Z")
            .expect("range should parse")
    }

    #[rstest]
    #[case::merged(ActivityKind::MergedPullRequest, "merged PR", "mergedAt", "mergedBy.login")]
    #[case::issue(ActivityKind::Issue, "issue", "createdAt", "author.login")]
    #[case::created(ActivityKind::CreatedPullRequest, "created PR", "createdAt", "author.login")]
    fn descriptors_declare_their_fields(
        #[case] kind: ActivityKind,
        #[case] name: &str,
        #[case] timestamp: &str,
        #[case] contributor: &str,
    ) {
        let descriptor = kind.descriptor();
        assert_eq!(descriptor.name(), name);
        assert_eq!(descriptor.timestamp_field(), timestamp);
        assert_eq!(descriptor.contributor_field(), contributor);
    }

    #[rstest]
    #[case::index("0", ActivityKind::MergedPullRequest)]
    #[case::last_index("2", ActivityKind::CreatedPullRequest)]
    #[case::label("issue", ActivityKind::Issue)]
    #[case::label_any_case("Merged PR", ActivityKind::MergedPullRequest)]
    #[case::slug("created-pr", ActivityKind::CreatedPullRequest)]
    fn kinds_parse_from_index_label_or_slug(#[case] input: &str, #[case] expected: ActivityKind) {
        let parsed: ActivityKind = input.parse().expect("kind should parse");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case::out_of_range("3")]
    #[case::unknown("commits")]
    fn unknown_kinds_are_rejected(#[case] input: &str) {
        let error = input.parse::<ActivityKind>().expect_err("kind should be rejected");
        assert_eq!(
            error,
            ActivityError::UnknownActivityKind {
                name: input.to_owned()
            }
        );
    }

    #[rstest]
    fn first_page_sends_unquoted_null_cursor(org: OrganisationLogin, window: DateRange) {
        let query = MERGED_PULL_REQUESTS.build(&QueryParams {
            org: &org,
            page_size: 100,
            cursor: None,
            window: &window,
        });

        assert!(query.contains("after: null"), "query was:\n{query}");
        assert!(query.contains("first: 100"), "query was:\n{query}");
        assert!(
            query.contains(
                "query: \"org:octo-org is:pr is:merged \
                 merged:2023-01-01T00:00:00Z..2023-01-10T00:00:00Z\""
            ),
            "query was:\n{query}"
        );
        assert!(query.contains("pageInfo {"), "query was:\n{query}");
        assert!(query.contains("rateLimit {"), "query was:\n{query}");
    }

    #[rstest]
    fn later_pages_quote_and_escape_the_cursor(org: OrganisationLogin, window: DateRange) {
        let query = ISSUES.build(&QueryParams {
            org: &org,
            page_size: 50,
            cursor: Some("Y3Vy\"c29y"),
            window: &window,
        });

        assert!(query.contains("after: \"Y3Vy\\\"c29y\""), "query was:\n{query}");
        assert!(query.contains("first: 50"), "query was:\n{query}");
        assert!(query.contains("-reason:NOT_PLANNED created:"), "query was:\n{query}");
        assert!(query.contains("... on Issue"), "query was:\n{query}");
    }

    #[rstest]
    fn oversized_page_size_is_clamped(org: OrganisationLogin, window: DateRange) {
        let query = CREATED_PULL_REQUESTS.build(&QueryParams {
            org: &org,
            page_size: u8::MAX,
            cursor: None,
            window: &window,
        });

        assert!(query.contains("first: 100"), "query was:\n{query}");
    }

    #[rstest]
    fn probe_query_targets_the_organisation(org: OrganisationLogin) {
        let query = organisation_probe_query(&org);
        assert!(query.contains("organization(login: \"octo-org\")"));
    }

    #[test]
    fn quoting_escapes_backslashes_and_control_characters() {
        assert_eq!(quote_graphql_string("a\\b\n\u{1}"), "\"a\\\\b\\n\\u0001\"");
    }
}

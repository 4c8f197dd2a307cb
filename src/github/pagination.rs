//! Cursor pagination state located inside arbitrary GraphQL responses.
//!
//! Different query shapes nest their connection at different depths
//! (`search` sits directly under `data`; commit history sits under
//! `repository.defaultBranchRef.target.history`). Rather than hard-coding a
//! path per query, [`find_page_container`] walks the decoded body and returns
//! the first object that carries a `pageInfo` key.

use serde_json::{Map, Value};

/// Deepest nesting [`find_page_container`] will descend into.
pub const MAX_SEARCH_DEPTH: usize = 32;

/// Cursor state reported by a GraphQL connection.
///
/// # Example
///
/// ```
/// use org_activity::github::pagination::PageInfo;
///
/// let info = PageInfo::new(true, Some("abc".to_owned()));
/// assert_eq!(info.next_cursor(), Some("abc"));
/// assert!(!PageInfo::default().has_next_page());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Whether the connection has more items after this page.
    has_next_page: bool,
    /// Opaque cursor pointing at the last item of this page.
    end_cursor: Option<String>,
}

impl PageInfo {
    /// Creates a new page info instance.
    #[must_use]
    pub const fn new(has_next_page: bool, end_cursor: Option<String>) -> Self {
        Self {
            has_next_page,
            end_cursor,
        }
    }

    /// Reads a `pageInfo` object, treating missing fields as "no next page".
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let has_next_page = value
            .get("hasNextPage")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let end_cursor = value
            .get("endCursor")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        Self::new(has_next_page, end_cursor)
    }

    /// Returns true if more pages exist after the current one.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    /// Returns the cursor of the last item on this page.
    #[must_use]
    pub fn end_cursor(&self) -> Option<&str> {
        self.end_cursor.as_deref()
    }

    /// Cursor to request next, or `None` when iteration should stop.
    ///
    /// A page that claims a successor but omits the cursor also stops
    /// iteration; requesting `after: null` again would loop forever.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor()
        } else {
            None
        }
    }
}

/// Items and cursor state extracted from one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSlice {
    /// Raw connection items, in response order.
    pub items: Vec<Value>,
    /// Cursor state for the connection.
    pub page_info: PageInfo,
}

/// Returns the first object, searching depth-first in key order, that
/// contains a `pageInfo` key.
///
/// Arrays are not entered: connections nested inside result nodes (comment
/// threads and the like) must not be mistaken for the outer connection.
/// Descent stops at [`MAX_SEARCH_DEPTH`].
#[must_use]
pub fn find_page_container(value: &Value) -> Option<&Map<String, Value>> {
    find_within(value, 0)
}

fn find_within(value: &Value, depth: usize) -> Option<&Map<String, Value>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    let object = value.as_object()?;
    if object.contains_key("pageInfo") {
        return Some(object);
    }

    object
        .values()
        .find_map(|child| find_within(child, depth + 1))
}

/// Extracts the connection items and page info from a response's `data`.
///
/// Items come from `edges` when that key holds an array, otherwise from
/// `nodes`. Returns `None` when no `pageInfo`-bearing object exists, which
/// callers treat as an empty result.
#[must_use]
pub fn extract_page(data: &Value) -> Option<PageSlice> {
    let container = find_page_container(data)?;

    let items = container
        .get("edges")
        .and_then(Value::as_array)
        .or_else(|| container.get("nodes").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    let page_info = container
        .get("pageInfo")
        .map(PageInfo::from_value)
        .unwrap_or_default();

    Some(PageSlice { items, page_info })
}

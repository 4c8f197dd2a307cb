//! Inclusive UTC date ranges used for search qualifiers and windowing.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use super::error::ActivityError;

/// Timestamp layout GitHub search qualifiers accept (`2023-01-01T00:00:00Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Inclusive `[since, until]` range with second resolution.
///
/// Both endpoints are sent verbatim to the search API, which compares them
/// inclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    since: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, requiring `since` to be strictly before `until`.
    ///
    /// Sub-second precision is discarded because search qualifiers only carry
    /// whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidDateRange`] when the range is empty or
    /// inverted.
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self, ActivityError> {
        let lower = truncate_to_second(since);
        let upper = truncate_to_second(until);
        if lower >= upper {
            return Err(ActivityError::InvalidDateRange {
                message: format!(
                    "since ({}) must be before until ({})",
                    format_timestamp(lower),
                    format_timestamp(upper)
                ),
            });
        }
        Ok(Self {
            since: lower,
            until: upper,
        })
    }

    /// Parses both endpoints from RFC 3339 timestamps or bare `YYYY-MM-DD`
    /// dates (midnight UTC).
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidDateRange`] when either endpoint fails
    /// to parse or the range is empty.
    pub fn parse(since: &str, until: &str) -> Result<Self, ActivityError> {
        Self::new(parse_timestamp(since)?, parse_timestamp(until)?)
    }

    /// Builds a window inside an already validated range. `since == until` is
    /// allowed and denotes a single-second window.
    pub(crate) const fn window(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { since, until }
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn until(&self) -> DateTime<Utc> {
        self.until
    }

    /// Distance between the endpoints.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.until - self.since
    }

    /// Lower bound formatted for a search qualifier.
    #[must_use]
    pub fn since_qualifier(&self) -> String {
        format_timestamp(self.since)
    }

    /// Upper bound formatted for a search qualifier.
    #[must_use]
    pub fn until_qualifier(&self) -> String {
        format_timestamp(self.until)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}..{}",
            self.since_qualifier(),
            self.until_qualifier()
        )
    }
}

/// Formats a timestamp the way search qualifiers expect.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ActivityError> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ActivityError::InvalidDateRange {
            message: format!("`{trimmed}` is neither an RFC 3339 timestamp nor a YYYY-MM-DD date"),
        })
}

fn truncate_to_second(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}

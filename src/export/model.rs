//! Export data model for JSONL output.

use serde::Serialize;

use crate::github::CanonicalEvent;

/// A canonical event prepared for export.
///
/// Serialises as the event's own fields with an optional top-level
/// `project_id` alongside them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportedEvent {
    /// Project the event is attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// The collected event.
    #[serde(flatten)]
    pub event: CanonicalEvent,
}

impl ExportedEvent {
    /// Wraps `event`, tagging it with `project_id` when one is given.
    #[must_use]
    pub const fn new(event: CanonicalEvent, project_id: Option<String>) -> Self {
        Self { project_id, event }
    }
}

impl From<CanonicalEvent> for ExportedEvent {
    fn from(event: CanonicalEvent) -> Self {
        Self::new(event, None)
    }
}

//! Structured event export.
//!
//! Collected events are written as JSON Lines, one object per event, in the
//! order they were collected. A configured project identifier is attached to
//! every line.

mod jsonl;
mod model;

pub use jsonl::write_jsonl;
pub use model::ExportedEvent;

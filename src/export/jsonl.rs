//! JSONL (JSON Lines) formatter for exported events.

use std::io::Write;

use crate::github::ActivityError;

use super::model::ExportedEvent;

/// Writes events in JSONL format to the given writer.
///
/// Each event is serialised as a single JSON object on its own line.
///
/// # Errors
///
/// Returns [`ActivityError::Io`] if writing to the output fails, or if JSON
/// serialisation fails.
pub fn write_jsonl<W: Write>(
    writer: &mut W,
    events: &[ExportedEvent],
) -> Result<(), ActivityError> {
    for event in events {
        serde_json::to_writer(&mut *writer, event).map_err(|e| ActivityError::Io {
            message: format!("JSON serialization failed: {e}"),
        })?;
        writeln!(writer).map_err(|e| io_error(&e))?;
    }
    writer.flush().map_err(|e| io_error(&e))
}

fn io_error(error: &std::io::Error) -> ActivityError {
    ActivityError::Io {
        message: error.to_string(),
    }
}

//! Output destination handling.

use std::fs::File;
use std::io::{self, BufWriter};

use camino::Utf8Path;
use org_activity::ActivityError;
use org_activity::export::{ExportedEvent, write_jsonl};

/// Writes events as JSONL to `path`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns [`ActivityError::Io`] when the file cannot be created or written.
pub fn write_output(
    path: Option<&Utf8Path>,
    events: &[ExportedEvent],
) -> Result<(), ActivityError> {
    if let Some(file_path) = path {
        let file = File::create(file_path).map_err(|e| ActivityError::Io {
            message: format!("failed to create output file '{file_path}': {e}"),
        })?;
        let mut writer = BufWriter::new(file);
        write_jsonl(&mut writer, events)
    } else {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        write_jsonl(&mut writer, events)
    }
}

//! JSON writer for the result tree.
//!
//! The document mirrors [`RunResult`] directly: statuses and error kinds are
//! lowercase strings, durations are whole milliseconds under `duration_ms`,
//! and empty optional collections are omitted.

use std::io;

use crate::result::RunResult;

/// Serialise a run as a compact JSON document.
///
/// # Examples
/// ```
/// use bddkit::RunResult;
/// use bddkit::reporting::json;
///
/// let mut buffer = Vec::new();
/// json::write(&mut buffer, &RunResult::default()).unwrap();
/// let text = String::from_utf8(buffer).unwrap();
/// assert!(text.contains("\"features\":[]"));
/// ```
///
/// # Errors
/// Returns any error raised while writing to `writer`.
pub fn write<W: io::Write>(writer: &mut W, result: &RunResult) -> serde_json::Result<()> {
    serde_json::to_writer(writer, result)
}

/// Serialise a run as indented JSON.
///
/// # Errors
/// Returns any error raised while writing to `writer`.
pub fn write_pretty<W: io::Write>(writer: &mut W, result: &RunResult) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, result)
}

/// Serialise a run into a compact JSON string.
///
/// # Examples
/// ```
/// use bddkit::RunResult;
/// use bddkit::reporting::json;
///
/// let text = json::to_string(&RunResult::default()).unwrap();
/// assert!(text.starts_with('{'));
/// ```
///
/// # Errors
/// Returns an error if serialisation fails.
pub fn to_string(result: &RunResult) -> serde_json::Result<String> {
    serde_json::to_string(result)
}

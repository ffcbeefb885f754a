//! Report writers for a finished run.
//!
//! A [`RunResult`] is the only thing a run produces. The writers here render
//! it for people and for CI: a plain-text [`summary`], the whole tree as JSON
//! and a JUnit XML document with one test suite per feature.

use std::fmt::Write;

use crate::result::{Counts, RunResult};

/// JSON writer for the result tree.
#[cfg(feature = "json")]
pub mod json;
/// JUnit XML writer for the result tree.
pub mod junit;

fn describe(counts: &Counts, noun: &str) -> String {
    let mut line = format!("{} {noun}", counts.total);
    if counts.total != 1 {
        line.push('s');
    }
    let parts: Vec<String> = [
        (counts.failed, "failed"),
        (counts.undefined, "undefined"),
        (counts.pending, "pending"),
        (counts.skipped, "skipped"),
        (counts.passed, "passed"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count} {label}"))
    .collect();
    if !parts.is_empty() {
        let _ = write!(line, " ({})", parts.join(", "));
    }
    line
}

/// Render the scenario and step counts of a run as two lines of text.
///
/// # Examples
/// ```
/// use bddkit::RunResult;
/// use bddkit::reporting::summary;
///
/// let mut result = RunResult::default();
/// result.summary.scenarios.total = 2;
/// result.summary.scenarios.passed = 1;
/// result.summary.scenarios.failed = 1;
/// assert_eq!(
///     summary(&result),
///     "2 scenarios (1 failed, 1 passed)\n0 steps"
/// );
/// ```
#[must_use]
pub fn summary(result: &RunResult) -> String {
    format!(
        "{}\n{}",
        describe(&result.summary.scenarios, "scenario"),
        describe(&result.summary.steps, "step")
    )
}

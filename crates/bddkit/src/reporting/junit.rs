//! JUnit XML writer for the result tree.
//!
//! Every feature becomes a `<testsuite>` inside a single `<testsuites>` root
//! and every scenario (or outline row) becomes a `<testcase>`. Failed
//! scenarios carry a `<failure>` whose `type` is the error kind; pending and
//! skipped scenarios carry a `<skipped>` element.

use std::fmt::{self, Write};
use std::time::Duration;

use crate::result::{Counts, ErrorInfo, FeatureResult, RunResult, ScenarioResult, Status};

/// Render a run as a `JUnit` XML document.
///
/// # Examples
/// ```
/// use bddkit::RunResult;
/// use bddkit::reporting::junit;
///
/// let mut output = String::new();
/// junit::write(&mut output, &RunResult::default()).unwrap();
/// assert!(output.contains("<testsuites"));
/// ```
///
/// # Errors
/// Returns an error if writing to the provided formatter fails.
pub fn write<W: Write>(writer: &mut W, result: &RunResult) -> fmt::Result {
    let scenarios = &result.summary.scenarios;
    writer.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
    writeln!(
        writer,
        "<testsuites name=\"bddkit\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{}\">",
        scenarios.total,
        scenarios.failed,
        not_run(scenarios),
        seconds(result.duration),
    )?;
    for feature in &result.features {
        write_suite(writer, feature)?;
    }
    writer.write_str("</testsuites>\n")
}

/// Render a run into a new string.
///
/// # Errors
/// Returns an error if formatting fails.
pub fn to_string(result: &RunResult) -> Result<String, fmt::Error> {
    let mut output = String::new();
    write(&mut output, result)?;
    Ok(output)
}

fn write_suite<W: Write>(writer: &mut W, feature: &FeatureResult) -> fmt::Result {
    let counts = &feature.summary.scenarios;
    writer.write_str("  <testsuite name=\"")?;
    write_escaped(writer, &feature.name)?;
    writeln!(
        writer,
        "\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{}\">",
        counts.total,
        counts.failed,
        not_run(counts),
        seconds(feature.duration),
    )?;
    let classname = feature.source.as_deref().unwrap_or(&feature.name);
    for scenario in &feature.scenarios {
        write_case(writer, classname, scenario)?;
    }
    writer.write_str("  </testsuite>\n")
}

fn write_case<W: Write>(writer: &mut W, classname: &str, scenario: &ScenarioResult) -> fmt::Result {
    writer.write_str("    <testcase name=\"")?;
    write_escaped(writer, &scenario.name)?;
    if let Some(example) = &scenario.example {
        write!(
            writer,
            " (examples {}, row {})",
            example.block + 1,
            example.row + 1
        )?;
    }
    writer.write_str("\" classname=\"")?;
    write_escaped(writer, classname)?;
    write!(writer, "\" time=\"{}\"", seconds(scenario.duration))?;
    match scenario.status {
        Status::Passed => writer.write_str(" />\n"),
        Status::Failed => {
            writer.write_str(">\n      <failure")?;
            if let Some(error) = first_error(scenario, |status| status == Status::Failed) {
                writer.write_str(" type=\"")?;
                writer.write_str(error.kind.label())?;
                writer.write_str("\" message=\"")?;
                write_escaped(writer, &error.message)?;
                writer.write_str("\">")?;
                write_escaped(writer, &error.message)?;
                writer.write_str("</failure>\n")?;
            } else {
                writer.write_str(" />\n")?;
            }
            writer.write_str("    </testcase>\n")
        }
        Status::Pending | Status::Undefined | Status::Skipped => {
            writer.write_str(">\n      <skipped")?;
            let pending = |status: Status| matches!(status, Status::Pending | Status::Undefined);
            if let Some(error) = first_error(scenario, pending) {
                writer.write_str(" message=\"")?;
                write_escaped(writer, &error.message)?;
                writer.write_char('"')?;
            }
            writer.write_str(" />\n    </testcase>\n")
        }
    }
}

/// Scenarios counted as neither passed nor failed.
fn not_run(counts: &Counts) -> usize {
    counts
        .total
        .saturating_sub(counts.failed)
        .saturating_sub(counts.passed)
}

/// The error that decided a scenario's status: the first error on a step whose
/// status satisfies `decisive`, else the first hook failure.
fn first_error(
    scenario: &ScenarioResult,
    decisive: impl Fn(Status) -> bool,
) -> Option<&ErrorInfo> {
    scenario
        .steps
        .iter()
        .filter(|step| decisive(step.status))
        .find_map(|step| step.error.as_ref())
        .or_else(|| scenario.hook_failures.first().map(|failure| &failure.error))
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn write_escaped<W: Write>(writer: &mut W, value: &str) -> fmt::Result {
    const INVALID_REPLACEMENT: &str = "&#xFFFD;";
    for character in value.chars() {
        if !is_valid_xml_character(character) {
            writer.write_str(INVALID_REPLACEMENT)?;
            continue;
        }
        match character {
            '&' => writer.write_str("&amp;")?,
            '<' => writer.write_str("&lt;")?,
            '>' => writer.write_str("&gt;")?,
            '"' => writer.write_str("&quot;")?,
            '\'' => writer.write_str("&apos;")?,
            other => writer.write_char(other)?,
        }
    }
    Ok(())
}

fn is_valid_xml_character(character: char) -> bool {
    matches!(
        u32::from(character),
        0x09 | 0x0A | 0x0D
            | 0x20..=0xD7FF
            | 0xE000..=0xFFFD
            | 0x1_0000..=0x10_FFFF
    )
}

//! Result tree produced by a run.
//!
//! A [`RunResult`] holds one [`FeatureResult`] per executed feature, each
//! holding [`ScenarioResult`]s with their [`StepResult`]s. Counts are
//! aggregated bottom-up into [`Summary`] values once a level completes and
//! never reinterpreted on the way up.

use std::fmt;
use std::time::Duration;

use bddkit_patterns::StepRole;

use crate::context::Attachment;
use crate::hooks::HookScope;

#[cfg(feature = "json")]
fn duration_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Outcome of a step, scenario, feature or run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum Status {
    /// Completed without error.
    Passed,
    /// A handler or hook failed, panicked or timed out.
    Failed,
    /// A handler signalled that it is not implemented yet; at scenario level
    /// also covers undefined steps.
    Pending,
    /// No step definition matched.
    Undefined,
    /// Not executed.
    #[default]
    Skipped,
}

impl Status {
    /// Lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Undefined => "undefined",
            Self::Skipped => "skipped",
        }
    }

    /// Combine child statuses into a parent status.
    ///
    /// `failed` wins over `pending` (which absorbs `undefined`), an all
    /// skipped list is `skipped`, and anything else is `passed`. An empty
    /// list is `passed`.
    ///
    /// # Examples
    /// ```
    /// use bddkit::Status;
    ///
    /// let status = Status::aggregate([Status::Passed, Status::Undefined, Status::Skipped]);
    /// assert_eq!(status, Status::Pending);
    /// assert_eq!(Status::aggregate([Status::Skipped, Status::Skipped]), Status::Skipped);
    /// ```
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut any = false;
        let mut all_skipped = true;
        let mut pending = false;
        for status in statuses {
            any = true;
            match status {
                Self::Failed => return Self::Failed,
                Self::Pending | Self::Undefined => pending = true,
                Self::Passed => {}
                Self::Skipped => continue,
            }
            all_skipped = false;
        }
        if pending {
            Self::Pending
        } else if any && all_skipped {
            Self::Skipped
        } else {
            Self::Passed
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of an error recorded on a step or hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum ErrorKind {
    /// The handler returned an error.
    Error,
    /// The handler panicked.
    Panic,
    /// The handler did not finish within its timeout.
    Timeout,
    /// A lifecycle hook failed before the step ran.
    Hook,
    /// No step definition matched.
    Undefined,
    /// The handler signalled pending.
    Pending,
}

impl ErrorKind {
    /// Lowercase label, matching the serialised form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Panic => "panic",
            Self::Timeout => "timeout",
            Self::Hook => "hook",
            Self::Undefined => "undefined",
            Self::Pending => "pending",
        }
    }
}

/// Error recorded verbatim in the result tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ErrorInfo {
    /// Category.
    pub kind: ErrorKind,
    /// Message produced by the handler, panic payload or engine.
    pub message: String,
}

impl ErrorInfo {
    /// Create an error record.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A hook that failed, panicked or timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct HookFailure {
    /// Lifecycle point the hook was registered for.
    pub scope: HookScope,
    /// Hook name.
    pub name: String,
    /// What went wrong.
    pub error: ErrorInfo,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hook `{}` failed: {}", self.scope, self.name, self.error)
    }
}

/// Position of an outline-expanded scenario within its Examples.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ExampleRef {
    /// Zero-based index of the Examples block.
    pub block: usize,
    /// Zero-based index of the row within the block body.
    pub row: usize,
    /// Column name and cell value pairs, in column order.
    pub values: Vec<(String, String)>,
}

impl ExampleRef {
    /// Value of `column` in this row.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Tallies of outcomes at one level of the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Counts {
    /// Number of entries.
    pub total: usize,
    /// Entries that passed.
    pub passed: usize,
    /// Entries that failed.
    pub failed: usize,
    /// Entries that are pending.
    pub pending: usize,
    /// Entries without a matching definition.
    pub undefined: usize,
    /// Entries that were not executed.
    pub skipped: usize,
}

impl Counts {
    /// Record one entry with `status`.
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Pending => self.pending += 1,
            Status::Undefined => self.undefined += 1,
            Status::Skipped => self.skipped += 1,
        }
    }

    /// Add another tally to this one.
    pub fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.pending += other.pending;
        self.undefined += other.undefined;
        self.skipped += other.skipped;
    }
}

impl<I: IntoIterator<Item = Status>> From<I> for Counts {
    fn from(statuses: I) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.record(status);
        }
        counts
    }
}

/// Aggregated counts for a feature or run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Summary {
    /// Feature outcomes. Zero inside a [`FeatureResult`].
    pub features: Counts,
    /// Scenario outcomes.
    pub scenarios: Counts,
    /// Step outcomes.
    pub steps: Counts,
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct StepResult {
    /// Keyword as written.
    pub keyword: String,
    /// Step text after outline substitution.
    pub text: String,
    /// Role used for matching.
    #[cfg_attr(feature = "json", serde(serialize_with = "serialize_role"))]
    pub role: StepRole,
    /// Source line.
    pub line: usize,
    /// Outcome.
    pub status: Status,
    /// Wall-clock time spent on the handler.
    #[cfg_attr(feature = "json", serde(rename = "duration_ms", serialize_with = "duration_millis"))]
    pub duration: Duration,
    /// Failure, pending reason or undefined-step explanation.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<ErrorInfo>,
    /// Closest registered patterns for an undefined step, best first.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub suggestions: Vec<String>,
    /// Data attached by the handler.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub attachments: Vec<Attachment>,
    /// Lines logged by the handler.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub logs: Vec<String>,
    /// Step hooks that failed around this step.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub hook_failures: Vec<HookFailure>,
}

#[cfg(feature = "json")]
fn serialize_role<S: serde::Serializer>(role: &StepRole, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(role.as_str())
}

/// Outcome of a scenario or of one outline example row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ScenarioResult {
    /// Name after outline substitution.
    pub name: String,
    /// Keyword as written.
    pub keyword: String,
    /// Source line of the scenario header.
    pub line: usize,
    /// Name of the enclosing rule.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Option::is_none"))]
    pub rule: Option<String>,
    /// Effective tags.
    pub tags: Vec<String>,
    /// Example row this result was expanded from.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Option::is_none"))]
    pub example: Option<ExampleRef>,
    /// Outcome.
    pub status: Status,
    /// Wall-clock time including hooks.
    #[cfg_attr(feature = "json", serde(rename = "duration_ms", serialize_with = "duration_millis"))]
    pub duration: Duration,
    /// Background and scenario steps in execution order.
    pub steps: Vec<StepResult>,
    /// Scenario hooks that failed.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub hook_failures: Vec<HookFailure>,
}

impl ScenarioResult {
    /// Tally of step outcomes.
    #[must_use]
    pub fn step_counts(&self) -> Counts {
        Counts::from(self.steps.iter().map(|step| step.status))
    }
}

/// Outcome of a feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct FeatureResult {
    /// Feature name.
    pub name: String,
    /// Source identifier of the document.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Option::is_none"))]
    pub source: Option<String>,
    /// Source line of the feature header.
    pub line: usize,
    /// Feature tags.
    pub tags: Vec<String>,
    /// Outcome.
    pub status: Status,
    /// Wall-clock time including hooks.
    #[cfg_attr(feature = "json", serde(rename = "duration_ms", serialize_with = "duration_millis"))]
    pub duration: Duration,
    /// Scenario results in execution order.
    pub scenarios: Vec<ScenarioResult>,
    /// Scenario and step counts.
    pub summary: Summary,
    /// Feature hooks that failed.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub hook_failures: Vec<HookFailure>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RunResult {
    /// Feature results in execution order.
    pub features: Vec<FeatureResult>,
    /// Outcome.
    pub status: Status,
    /// Wall-clock time of the run.
    #[cfg_attr(feature = "json", serde(rename = "duration_ms", serialize_with = "duration_millis"))]
    pub duration: Duration,
    /// Feature, scenario and step counts.
    pub summary: Summary,
    /// Run-level hooks that failed.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Vec::is_empty"))]
    pub hook_failures: Vec<HookFailure>,
}

impl RunResult {
    /// Return `true` when nothing failed and nothing is pending.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.hook_failures.is_empty()
            && self.summary.scenarios.failed == 0
            && self.summary.scenarios.pending == 0
            && self.summary.features.failed == 0
    }

    /// Every scenario result, in execution order.
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.features
            .iter()
            .flat_map(|feature| feature.scenarios.iter())
    }
}

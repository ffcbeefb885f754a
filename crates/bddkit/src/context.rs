//! Per-step context handed to step handlers, and the handler error type.
//!
//! A [`StepContext`] is built fresh for every step invocation. It carries the
//! typed arguments extracted by the matching pattern, the step's data table
//! and doc string, and two side channels: [`StepContext::attach`] and
//! [`StepContext::log`]. Whatever a handler writes to them ends up on the
//! step's entry in the result tree.

use std::any::Any;
use std::fmt;

use bddkit_gherkin::{DataTable, DocString};
use bddkit_patterns::{StepArg, StepRole};
use thiserror::Error;

/// Message that marks a plain failure as pending.
pub(crate) const PENDING_SENTINEL: &str = "PENDING";

/// Error returned by step and hook handlers.
///
/// # Examples
/// ```
/// use bddkit::StepError;
///
/// assert!(StepError::pending().is_pending());
/// assert!(StepError::failed("PENDING").is_pending());
/// assert!(!StepError::failed("boom").is_pending());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The handler failed.
    #[error("{0}")]
    Failed(String),
    /// The step is not implemented yet.
    #[error("{}", .0.as_deref().unwrap_or(PENDING_SENTINEL))]
    Pending(Option<String>),
    /// The handler asked for an argument the pattern did not capture.
    #[error("step argument {index} is missing")]
    MissingArgument {
        /// Zero-based argument index.
        index: usize,
    },
    /// The captured argument has a different type than requested.
    #[error("step argument {index} is not {expected}")]
    ArgumentType {
        /// Zero-based argument index.
        index: usize,
        /// Expected kind of value.
        expected: &'static str,
    },
    /// The handler requires a data table the step does not have.
    #[error("step has no data table")]
    MissingTable,
    /// The handler requires a doc string the step does not have.
    #[error("step has no doc string")]
    MissingDocString,
}

impl StepError {
    /// Build a [`StepError::Failed`] from any displayable value.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }

    /// Build a [`StepError::Pending`] without a reason.
    #[must_use]
    pub const fn pending() -> Self {
        Self::Pending(None)
    }

    /// Return `true` for pending signals, including failures whose message is
    /// exactly `PENDING`.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match self {
            Self::Pending(_) => true,
            Self::Failed(message) => message == PENDING_SENTINEL,
            _ => false,
        }
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Data attached to a step through [`StepContext::attach`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Attachment {
    /// Attached payload.
    pub data: String,
    /// Media type describing the payload, e.g. `text/plain`.
    pub media_type: String,
}

/// Context passed to a step handler.
///
/// # Examples
/// ```
/// use bddkit::{StepArg, StepContext};
///
/// let mut ctx = StepContext::new("I have 3 items").with_args(vec![StepArg::Int(3)]);
/// assert_eq!(ctx.arg_int(0), Ok(3));
/// ctx.log("counted");
/// assert_eq!(ctx.logs(), ["counted".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    text: String,
    role: Option<StepRole>,
    args: Vec<StepArg>,
    labels: Vec<String>,
    table: Option<DataTable>,
    doc_string: Option<DocString>,
    attachments: Vec<Attachment>,
    logs: Vec<String>,
}

impl StepContext {
    /// Create a context for `text` without arguments.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the matched arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<StepArg>) -> Self {
        self.args = args;
        self
    }

    /// Set the placeholder labels matching the arguments.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Set the resolved role of the step.
    #[must_use]
    pub fn with_role(mut self, role: StepRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Attach a data table.
    #[must_use]
    pub fn with_table(mut self, table: Option<DataTable>) -> Self {
        self.table = table;
        self
    }

    /// Attach a doc string.
    #[must_use]
    pub fn with_doc_string(mut self, doc_string: Option<DocString>) -> Self {
        self.doc_string = doc_string;
        self
    }

    /// Step text after outline substitution.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Role the step was resolved to.
    #[must_use]
    pub fn role(&self) -> Option<StepRole> {
        self.role
    }

    /// All matched arguments in pattern order.
    #[must_use]
    pub fn args(&self) -> &[StepArg] {
        &self.args
    }

    /// Argument at `index`.
    ///
    /// # Errors
    /// Returns [`StepError::MissingArgument`] when the pattern captured fewer
    /// arguments.
    pub fn arg(&self, index: usize) -> Result<&StepArg, StepError> {
        self.args
            .get(index)
            .ok_or(StepError::MissingArgument { index })
    }

    /// Argument captured for the placeholder labelled `label`.
    #[must_use]
    pub fn named(&self, label: &str) -> Option<&StepArg> {
        self.labels
            .iter()
            .position(|candidate| candidate == label)
            .and_then(|index| self.args.get(index))
    }

    /// Textual argument at `index`.
    ///
    /// # Errors
    /// Returns a [`StepError`] when the argument is missing or not text.
    pub fn arg_str(&self, index: usize) -> Result<&str, StepError> {
        self.arg(index)?.as_str().ok_or(StepError::ArgumentType {
            index,
            expected: "text",
        })
    }

    /// Integer argument at `index`.
    ///
    /// # Errors
    /// Returns a [`StepError`] when the argument is missing or not an integer.
    pub fn arg_int(&self, index: usize) -> Result<i64, StepError> {
        self.arg(index)?.as_int().ok_or(StepError::ArgumentType {
            index,
            expected: "an integer",
        })
    }

    /// Numeric argument at `index`; integers are widened.
    ///
    /// # Errors
    /// Returns a [`StepError`] when the argument is missing or not numeric.
    pub fn arg_float(&self, index: usize) -> Result<f64, StepError> {
        self.arg(index)?.as_float().ok_or(StepError::ArgumentType {
            index,
            expected: "a number",
        })
    }

    /// Custom-typed argument at `index`.
    ///
    /// # Errors
    /// Returns a [`StepError`] when the argument is missing or holds another
    /// type.
    pub fn arg_custom<T: Any>(&self, index: usize) -> Result<&T, StepError> {
        self.arg(index)?
            .downcast_ref::<T>()
            .ok_or(StepError::ArgumentType {
                index,
                expected: std::any::type_name::<T>(),
            })
    }

    /// The step's data table, if any.
    #[must_use]
    pub fn table(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    /// The step's data table.
    ///
    /// # Errors
    /// Returns [`StepError::MissingTable`] when the step has none.
    pub fn require_table(&self) -> Result<&DataTable, StepError> {
        self.table().ok_or(StepError::MissingTable)
    }

    /// Content of the step's doc string, if any.
    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        self.doc_string.as_ref().map(|doc| doc.content.as_str())
    }

    /// Media type written after the doc string's opening delimiter.
    #[must_use]
    pub fn doc_string_media_type(&self) -> Option<&str> {
        self.doc_string
            .as_ref()
            .and_then(|doc| doc.media_type.as_deref())
    }

    /// Content of the step's doc string.
    ///
    /// # Errors
    /// Returns [`StepError::MissingDocString`] when the step has none.
    pub fn require_doc_string(&self) -> Result<&str, StepError> {
        self.doc_string().ok_or(StepError::MissingDocString)
    }

    /// Attach data to the step's result.
    pub fn attach(&mut self, data: impl Into<String>, media_type: impl Into<String>) {
        self.attachments.push(Attachment {
            data: data.into(),
            media_type: media_type.into(),
        });
    }

    /// Append a log line to the step's result.
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    /// Attachments recorded so far.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Log lines recorded so far.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub(crate) fn into_outputs(self) -> (Vec<Attachment>, Vec<String>) {
        (self.attachments, self.logs)
    }
}

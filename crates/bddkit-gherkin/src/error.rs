//! Diagnostics and errors reported by the parser.

use std::fmt;

use thiserror::Error;

/// Category of a non-fatal parser finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// `# language:` named a dialect that is not registered.
    UnknownLanguage,
    /// A line matched nothing the parser understands in its position.
    UnrecognisedLine,
    /// The document holds no `Feature:` header.
    MissingFeature,
    /// A second `Feature:` header was ignored.
    DuplicateFeature,
    /// A structural element appeared before the feature header.
    OutsideFeature,
    /// Tags were followed by something that cannot carry tags.
    OrphanTags,
    /// A step appeared outside a background or scenario.
    StepOutsideScenario,
    /// A table row appeared outside a step or examples block.
    TableOutsideStep,
    /// A doc string appeared outside a step.
    DocStringOutsideStep,
    /// A step received a second argument.
    DuplicateStepArgument,
    /// A doc string was still open at the end of the input.
    UnterminatedDocString,
    /// A table row lacked its closing pipe.
    UnterminatedTableRow,
    /// Table rows disagree on their cell count.
    InconsistentTable,
    /// An `Examples:` block appeared without a scenario to attach to.
    ExamplesOutsideScenario,
}

/// A non-fatal parser finding tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// One-based source line; `0` for whole-document findings.
    pub line: usize,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(kind: DiagnosticKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Fatal parser failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token on a tag line did not start with `@` or was `@` alone.
    #[error("line {line}: malformed tag `{token}`")]
    MalformedTag {
        /// One-based source line.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// The requested default dialect is not registered.
    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),
    /// Strict parsing found diagnostics.
    #[error("{} diagnostic(s), first: {}", .0.len(), first_diagnostic(.0))]
    Diagnostics(Vec<Diagnostic>),
}

fn first_diagnostic(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map_or_else(String::new, ToString::to_string)
}

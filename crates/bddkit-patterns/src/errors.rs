//! Errors raised while compiling step patterns and converting captures.

use thiserror::Error;

/// What went wrong with the brace syntax of a step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxFault {
    /// A `{name` placeholder runs to the end of the pattern.
    UnclosedPlaceholder,
    /// A placeholder body is not `name` or `label:type`.
    MalformedPlaceholder,
    /// A `}` appears with no `{` to close.
    UnmatchedClose,
    /// A literal `{` was never closed.
    UnbalancedBraces,
}

impl SyntaxFault {
    /// Short description used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::UnclosedPlaceholder => "missing closing '}' for placeholder",
            Self::MalformedPlaceholder => "invalid placeholder in step pattern",
            Self::UnmatchedClose => "unmatched closing brace '}' in step pattern",
            Self::UnbalancedBraces => "unbalanced braces in step pattern",
        }
    }
}

/// Errors surfaced while compiling step patterns or converting their captures.
///
/// # Examples
/// ```
/// use bddkit_patterns::{ParameterTypes, PatternError, StepPattern, SyntaxFault};
/// let Err(err) = StepPattern::compile("I have {count", &ParameterTypes::default()) else {
///     panic!("unclosed placeholders are rejected");
/// };
/// assert!(matches!(err, PatternError::Syntax { fault: SyntaxFault::UnclosedPlaceholder, .. }));
/// assert_eq!(err.placeholder(), Some("count"));
/// ```
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    /// Brace or placeholder syntax in the pattern is malformed.
    #[error(
        "{}{} at byte {}",
        .fault.describe(),
        named(.placeholder.as_deref()),
        .offset
    )]
    Syntax {
        /// Kind of syntax problem.
        fault: SyntaxFault,
        /// Byte offset in the pattern where the problem was detected.
        offset: usize,
        /// Label of the offending placeholder, when one was being read.
        placeholder: Option<String>,
    },
    /// The generated or supplied regular expression failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// A captured value could not be converted by its parameter type.
    #[error("cannot convert {value:?} for parameter `{parameter}` ({type_name}): {reason}")]
    Transform {
        /// Label of the parameter whose capture failed.
        parameter: String,
        /// Name of the parameter type applied to the capture.
        type_name: String,
        /// The captured text.
        value: String,
        /// Reason reported by the transform.
        reason: String,
    },
}

impl PatternError {
    pub(crate) const fn syntax(
        fault: SyntaxFault,
        offset: usize,
        placeholder: Option<String>,
    ) -> Self {
        Self::Syntax {
            fault,
            offset,
            placeholder,
        }
    }

    /// Label of the placeholder involved in a syntax error.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Self::Syntax { placeholder, .. } => placeholder.as_deref(),
            Self::Regex(_) | Self::Transform { .. } => None,
        }
    }
}

fn named(placeholder: Option<&str>) -> String {
    placeholder.map_or_else(String::new, |name| format!(" for `{{{name}}}`"))
}

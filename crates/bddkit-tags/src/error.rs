//! Error type reported by the tag-expression lexer and parser.

use thiserror::Error;

/// Broad category of a tag-expression failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagExprErrorKind {
    /// The expression holds no tokens.
    Empty,
    /// A character outside the token grammar.
    UnexpectedCharacter,
    /// A token in a position the grammar does not allow.
    UnexpectedToken,
    /// A parenthesis without its partner.
    UnmatchedParenthesis,
}

/// Failure to parse a tag expression, located by byte offset.
///
/// # Examples
/// ```
/// use bddkit_tags::{TagExpression, TagExprErrorKind};
///
/// let err = TagExpression::parse("(@a or @b").unwrap_err();
/// assert_eq!(err.kind(), TagExprErrorKind::UnmatchedParenthesis);
/// assert_eq!(err.offset(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag expression at byte {offset}: {reason}")]
pub struct TagExprError {
    kind: TagExprErrorKind,
    offset: usize,
    reason: String,
}

impl TagExprError {
    pub(crate) fn new(kind: TagExprErrorKind, offset: usize, reason: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            reason: reason.into(),
        }
    }

    /// Category of the failure.
    #[must_use]
    pub fn kind(&self) -> TagExprErrorKind {
        self.kind
    }

    /// Zero-based byte offset where the failure was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Human-readable reason without the location prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

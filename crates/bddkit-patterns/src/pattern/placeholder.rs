//! Placeholder parsing used by the lexer.

use crate::errors::{PatternError, SyntaxFault};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaceholderSpec {
    /// Label reported for the parameter.
    pub label: String,
    /// Parameter type name; equal to the label for `{name}` placeholders.
    pub type_name: String,
    pub start: usize,
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Return `true` when `ch` may open a placeholder name.
pub(crate) fn starts_name(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Parse the placeholder whose opening brace sits at byte `start`.
///
/// Returns the byte offset just past the closing brace together with the
/// parsed label and type.
pub(crate) fn parse_placeholder(
    pattern: &str,
    start: usize,
) -> Result<(usize, PlaceholderSpec), PatternError> {
    let fail = |fault, label: &str| PatternError::syntax(fault, start, Some(label.to_string()));

    let body_start = start + '{'.len_utf8();
    let body = pattern.get(body_start..).unwrap_or_default();
    let name_len = body.find(|ch: char| !is_name_char(ch)).unwrap_or(body.len());
    let (label, after) = body.split_at(name_len);

    let (type_name, consumed) = match after.chars().next() {
        Some('}') => (label, 0),
        Some(':') => {
            let hinted = after.get(1..).unwrap_or_default();
            let Some(close) = hinted.find('}') else {
                return Err(fail(SyntaxFault::UnclosedPlaceholder, label));
            };
            let type_name = hinted.get(..close).unwrap_or_default();
            if type_name.is_empty() || !type_name.chars().all(is_name_char) {
                return Err(fail(SyntaxFault::MalformedPlaceholder, label));
            }
            (type_name, ':'.len_utf8() + close)
        }
        Some(_) => return Err(fail(SyntaxFault::MalformedPlaceholder, label)),
        None => return Err(fail(SyntaxFault::UnclosedPlaceholder, label)),
    };

    let end = body_start + name_len + consumed + '}'.len_utf8();
    Ok((
        end,
        PlaceholderSpec {
            label: label.to_string(),
            type_name: type_name.to_string(),
            start,
        },
    ))
}

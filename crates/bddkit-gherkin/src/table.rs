//! Table-row splitting and doc-string helpers shared by the parser and the
//! renderer.

use crate::ast::DocStringDelimiter;

/// Cells of a table row and whether the row ended with a pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitRow {
    pub cells: Vec<String>,
    pub terminated: bool,
}

/// Split a trimmed table line (starting with `|`) into unescaped cells.
///
/// `\|`, `\n` and `\\` are unescaped; any other backslash is kept.
pub(crate) fn split_row(line: &str) -> SplitRow {
    let body = line.strip_prefix('|').unwrap_or(line);
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('|') => cell.push('|'),
                Some('n') => cell.push('\n'),
                Some('\\') => cell.push('\\'),
                Some(other) => {
                    cell.push('\\');
                    cell.push(other);
                }
                None => cell.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            other => cell.push(other),
        }
    }
    let remainder = cell.trim();
    let terminated = remainder.is_empty();
    if !terminated {
        cells.push(remainder.to_string());
    }
    SplitRow { cells, terminated }
}

/// Escape a cell value for rendering.
pub(crate) fn escape_cell(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    for ch in cell.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Recognise an opening or closing doc-string delimiter at the start of a
/// trimmed line, returning the delimiter and the text after it.
pub(crate) fn doc_string_delimiter(line: &str) -> Option<(DocStringDelimiter, &str)> {
    [DocStringDelimiter::Quotes, DocStringDelimiter::Backticks]
        .into_iter()
        .find_map(|delimiter| {
            line.strip_prefix(delimiter.as_str())
                .map(|rest| (delimiter, rest))
        })
}

fn escaped_delimiter(delimiter: DocStringDelimiter) -> &'static str {
    match delimiter {
        DocStringDelimiter::Quotes => "\\\"\\\"\\\"",
        DocStringDelimiter::Backticks => "\\`\\`\\`",
    }
}

/// Replace escaped delimiters inside doc-string content.
pub(crate) fn unescape_doc_line(line: &str, delimiter: DocStringDelimiter) -> String {
    line.replace(escaped_delimiter(delimiter), delimiter.as_str())
}

/// Escape delimiters inside doc-string content for rendering.
pub(crate) fn escape_doc_line(line: &str, delimiter: DocStringDelimiter) -> String {
    line.replace(delimiter.as_str(), escaped_delimiter(delimiter))
}

/// Remove up to `indent` leading whitespace characters.
pub(crate) fn dedent(line: &str, indent: usize) -> &str {
    let mut rest = line;
    for _ in 0..indent {
        let Some(next) = rest.strip_prefix(char::is_whitespace) else {
            break;
        };
        rest = next;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("| a | b |", &["a", "b"], true)]
    #[case("|a|", &["a"], true)]
    #[case("| | empty |", &["", "empty"], true)]
    #[case(r"| pipe \| here | nl \n | back \\ slash |", &["pipe | here", "nl \n", r"back \ slash"], true)]
    #[case(r"| other \t kept |", &[r"other \t kept"], true)]
    #[case("| open | row", &["open", "row"], false)]
    fn splits_rows(#[case] line: &str, #[case] cells: &[&str], #[case] terminated: bool) {
        let row = split_row(line);
        assert_eq!(row.cells, cells);
        assert_eq!(row.terminated, terminated);
    }

    #[test]
    fn escaping_reverses_splitting() {
        let original = "a | b \\ c\nd";
        let line = format!("| {} |", escape_cell(original));
        assert_eq!(split_row(&line).cells, vec![original.to_string()]);
    }

    #[rstest]
    #[case("      body", 4, "  body")]
    #[case("  body", 4, "body")]
    #[case("\tbody", 1, "body")]
    fn dedents_up_to_indent(#[case] line: &str, #[case] indent: usize, #[case] expected: &str) {
        assert_eq!(dedent(line, indent), expected);
    }

    #[test]
    fn recognises_delimiters_with_media_type() {
        assert_eq!(
            doc_string_delimiter("```json"),
            Some((DocStringDelimiter::Backticks, "json"))
        );
        assert_eq!(doc_string_delimiter("\"\"\""), Some((DocStringDelimiter::Quotes, "")));
        assert_eq!(doc_string_delimiter("`` no"), None);
    }

    #[test]
    fn unescapes_doc_string_delimiters() {
        assert_eq!(
            unescape_doc_line(r#"say \"\"\" twice"#, DocStringDelimiter::Quotes),
            r#"say """ twice"#
        );
        assert_eq!(
            escape_doc_line("```", DocStringDelimiter::Backticks),
            r"\`\`\`"
        );
    }
}

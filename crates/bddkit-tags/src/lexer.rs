//! Tokeniser for tag expressions.
//!
//! Tags keep their leading `@` and may contain word characters and hyphens.
//! Keywords are matched case-insensitively, so `@fast Or not @wip` is valid.

use std::fmt;

use crate::error::{TagExprError, TagExprErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Tag(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::And => f.write_str("'and'"),
            Self::Or => f.write_str("'or'"),
            Self::Not => f.write_str("'not'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::End => f.write_str("<end>"),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
}

fn is_tag_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-')
}

/// Byte offset just past the run of tag characters starting at `from`.
fn word_end(input: &str, from: usize) -> usize {
    input
        .get(from..)
        .and_then(|rest| rest.find(|ch: char| !is_tag_char(ch)))
        .map_or(input.len(), |len| from + len)
}

fn keyword(word: &str, start: usize) -> Result<TokenKind, TagExprError> {
    if word.eq_ignore_ascii_case("and") {
        Ok(TokenKind::And)
    } else if word.eq_ignore_ascii_case("or") {
        Ok(TokenKind::Or)
    } else if word.eq_ignore_ascii_case("not") {
        Ok(TokenKind::Not)
    } else {
        Err(TagExprError::new(
            TagExprErrorKind::UnexpectedToken,
            start,
            format!("unexpected identifier '{word}'"),
        ))
    }
}

/// Split `input` into tokens, closing the stream with [`TokenKind::End`].
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, TagExprError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(ch) = input.get(pos..).and_then(|rest| rest.chars().next()) {
        let start = pos;
        pos += ch.len_utf8();
        let kind = match ch {
            c if c.is_whitespace() => continue,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '@' => {
                pos = word_end(input, pos);
                if pos == start + 1 {
                    return Err(TagExprError::new(
                        TagExprErrorKind::UnexpectedToken,
                        pos,
                        "expected tag name after '@'",
                    ));
                }
                TokenKind::Tag(input.get(start..pos).unwrap_or_default().to_string())
            }
            c if c.is_alphabetic() => {
                pos = word_end(input, pos);
                keyword(input.get(start..pos).unwrap_or_default(), start)?
            }
            other => {
                return Err(TagExprError::new(
                    TagExprErrorKind::UnexpectedCharacter,
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        tokens.push(Token { kind, start });
    }
    tokens.push(Token {
        kind: TokenKind::End,
        start: input.len(),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap_or_else(|err| panic!("{input} should tokenise: {err}"))
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn splits_tags_keywords_and_parentheses() {
        assert_eq!(
            kinds("not(@wip-1 OR @é)"),
            vec![
                TokenKind::Not,
                TokenKind::LParen,
                TokenKind::Tag("@wip-1".into()),
                TokenKind::Or,
                TokenKind::Tag("@é".into()),
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn end_token_sits_at_the_input_length() {
        let tokens = tokenize("@a  ").unwrap_or_else(|err| panic!("should tokenise: {err}"));
        assert_eq!(tokens.last().map(|token| token.start), Some(4));
    }
}

//! Splits a step pattern into literal runs, placeholders and stray braces.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::errors::PatternError;

use super::placeholder::{PlaceholderSpec, parse_placeholder, starts_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder {
        start: usize,
        label: String,
        type_name: String,
    },
    OpenBrace {
        index: usize,
    },
    CloseBrace {
        index: usize,
    },
}

struct Lexer<'p> {
    pattern: &'p str,
    chars: Peekable<CharIndices<'p>>,
    tokens: Vec<Token>,
    literal: String,
}

impl<'p> Lexer<'p> {
    fn new(pattern: &'p str) -> Self {
        Self {
            pattern,
            chars: pattern.char_indices().peekable(),
            tokens: Vec::new(),
            literal: String::new(),
        }
    }

    fn emit(&mut self, token: Token) {
        if !self.literal.is_empty() {
            self.tokens
                .push(Token::Literal(std::mem::take(&mut self.literal)));
        }
        self.tokens.push(token);
    }

    fn open_brace(&mut self, pos: usize) -> Result<(), PatternError> {
        if self.chars.next_if(|&(_, next)| next == '{').is_some() {
            self.literal.push('{');
            return Ok(());
        }
        if !self.chars.peek().is_some_and(|&(_, next)| starts_name(next)) {
            self.emit(Token::OpenBrace { index: pos });
            return Ok(());
        }
        let (end, spec) = parse_placeholder(self.pattern, pos)?;
        let PlaceholderSpec {
            label,
            type_name,
            start,
        } = spec;
        self.emit(Token::Placeholder {
            start,
            label,
            type_name,
        });
        while self.chars.next_if(|&(idx, _)| idx < end).is_some() {}
        Ok(())
    }

    fn close_brace(&mut self, pos: usize) {
        if self.chars.next_if(|&(_, next)| next == '}').is_some() {
            self.literal.push('}');
        } else {
            self.emit(Token::CloseBrace { index: pos });
        }
    }

    fn run(mut self) -> Result<Vec<Token>, PatternError> {
        while let Some((pos, ch)) = self.chars.next() {
            match ch {
                '\\' => {
                    let escaped = self.chars.next().map_or('\\', |(_, next)| next);
                    self.literal.push(escaped);
                }
                '{' => self.open_brace(pos)?,
                '}' => self.close_brace(pos),
                other => self.literal.push(other),
            }
        }
        if !self.literal.is_empty() {
            self.tokens.push(Token::Literal(self.literal));
        }
        Ok(self.tokens)
    }
}

/// Tokenise `pattern`. `{{` and `}}` and backslash escapes become literal
/// text; a `{` followed by a name character opens a placeholder.
pub(crate) fn lex_pattern(pattern: &str) -> Result<Vec<Token>, PatternError> {
    Lexer::new(pattern).run()
}

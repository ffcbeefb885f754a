//! Precedence-climbing parser over the token list.

use crate::ast::Expr;
use crate::error::{TagExprError, TagExprErrorKind};
use crate::lexer::{Token, TokenKind, tokenize};

/// Binding power of the binary operators; `and` binds tighter than `or`.
fn binding_power(kind: &TokenKind) -> Option<(u8, &'static str)> {
    match kind {
        TokenKind::Or => Some((1, "or")),
        TokenKind::And => Some((2, "and")),
        _ => None,
    }
}

fn unexpected(start: usize, reason: impl Into<String>) -> TagExprError {
    TagExprError::new(TagExprErrorKind::UnexpectedToken, start, reason)
}

fn unmatched(start: usize, reason: &str) -> TagExprError {
    TagExprError::new(TagExprErrorKind::UnmatchedParenthesis, start, reason)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    end: Token,
}

impl Parser {
    fn current(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&self.end)
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        self.cursor += 1;
        token
    }

    /// Fail unless the current token can start an operand.
    fn require_operand(&self, after: &str) -> Result<(), TagExprError> {
        let token = self.current();
        match token.kind {
            TokenKind::Tag(_) | TokenKind::Not | TokenKind::LParen => Ok(()),
            _ => Err(unexpected(
                token.start,
                format!("expected tag or '(' after '{after}'"),
            )),
        }
    }

    fn expression(&mut self, min_power: u8) -> Result<Expr, TagExprError> {
        let mut lhs = self.operand()?;
        while let Some((power, name)) = binding_power(&self.current().kind) {
            if power < min_power {
                break;
            }
            let operator = self.bump().kind;
            self.require_operand(name)?;
            let rhs = self.expression(power + 1)?;
            lhs = if operator == TokenKind::And {
                Expr::And(Box::new(lhs), Box::new(rhs))
            } else {
                Expr::Or(Box::new(lhs), Box::new(rhs))
            };
        }
        Ok(lhs)
    }

    fn operand(&mut self) -> Result<Expr, TagExprError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Tag(tag) => Ok(Expr::Tag(tag)),
            TokenKind::Not => {
                self.require_operand("not")?;
                Ok(Expr::Not(Box::new(self.operand()?)))
            }
            TokenKind::LParen => {
                let inner = self.expression(1)?;
                let close = self.bump();
                match close.kind {
                    TokenKind::RParen => Ok(inner),
                    TokenKind::End => Err(unmatched(token.start, "missing ')'")),
                    other => Err(unexpected(
                        close.start,
                        format!("expected ')' but found {other}"),
                    )),
                }
            }
            TokenKind::RParen => Err(unmatched(token.start, "unmatched ')'")),
            TokenKind::End => Err(unexpected(token.start, "expected tag or '('")),
            other => Err(unexpected(
                token.start,
                format!("expected tag or '(' but found {other}"),
            )),
        }
    }

    fn finish(&self) -> Result<(), TagExprError> {
        let token = self.current();
        match &token.kind {
            TokenKind::End => Ok(()),
            TokenKind::RParen => Err(unmatched(token.start, "unmatched ')'")),
            other => Err(unexpected(token.start, format!("unexpected token {other}"))),
        }
    }
}

/// Parse a non-empty expression into its tree.
pub(crate) fn parse(input: &str) -> Result<Expr, TagExprError> {
    let tokens = tokenize(input)?;
    let end = Token {
        kind: TokenKind::End,
        start: input.len(),
    };
    let mut parser = Parser {
        tokens,
        cursor: 0,
        end,
    };
    let root = parser.expression(1)?;
    parser.finish()?;
    Ok(root)
}

//! Tag-expression parsing, evaluation and tag-set utilities.
//!
//! Tag expressions combine `@tag` operands with `not`, `and`, `or` and
//! parentheses. [`TagExpression`] holds the parsed tree; [`TagFilter`] wraps
//! it with a fast path for filters consisting of a single tag.

mod ast;
mod error;
mod filter;
mod lexer;
mod parser;
mod sets;

pub use ast::{Expr, TagExpression};
pub use error::{TagExprError, TagExprErrorKind};
pub use filter::{TagFilter, filter_accepts};
pub use sets::merge_tag_sets;

#[cfg(test)]
mod tests;

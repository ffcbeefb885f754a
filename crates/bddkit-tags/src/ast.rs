//! Abstract syntax tree and evaluation for tag expressions.
//!
//! Precedence follows Gherkin conventions: `not` binds tighter than `and`,
//! which binds tighter than `or`. Binary operators associate to the left, so
//! `@a or @b and @c` parses as `@a or (@b and @c)`.
//!
//! Evaluation is exact membership of the tag text (including the leading
//! `@`) in the supplied tag set.

use std::collections::HashSet;
use std::fmt;

use crate::error::{TagExprError, TagExprErrorKind};
use crate::parser;

/// Node of a parsed tag expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// A tag operand such as `@smoke`.
    Tag(String),
    /// Logical negation.
    Not(Box<Expr>),
    /// Logical conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Logical disjunction.
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate the node against a tag set.
    #[must_use]
    pub fn eval(&self, tags: &HashSet<&str>) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag.as_str()),
            Self::Not(inner) => !inner.eval(tags),
            Self::And(lhs, rhs) => lhs.eval(tags) && rhs.eval(tags),
            Self::Or(lhs, rhs) => lhs.eval(tags) || rhs.eval(tags),
        }
    }

    fn collect_tags<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Tag(tag) => out.push(tag),
            Self::Not(inner) => inner.collect_tags(out),
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_tags(out);
                rhs.collect_tags(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Not(inner) => write!(f, "not ({inner})"),
            Self::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
        }
    }
}

/// Parsed representation of a tag expression.
///
/// # Examples
/// ```
/// use bddkit_tags::TagExpression;
///
/// let expr = TagExpression::parse("@fast and not @wip").expect("valid expression");
/// assert!(expr.evaluate(["@fast"]));
/// assert!(!expr.evaluate(["@fast", "@wip"]));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagExpression {
    root: Expr,
}

impl TagExpression {
    /// Parse an expression.
    ///
    /// # Errors
    /// Returns [`TagExprError`] for empty input, unknown characters,
    /// misplaced tokens and unbalanced parentheses.
    pub fn parse(input: &str) -> Result<Self, TagExprError> {
        if input.trim().is_empty() {
            return Err(TagExprError::new(
                TagExprErrorKind::Empty,
                0,
                "empty tag expression",
            ));
        }
        parser::parse(input).map(|root| Self { root })
    }

    /// Wrap an already built tree.
    #[must_use]
    pub fn from_expr(root: Expr) -> Self {
        Self { root }
    }

    /// Root node of the tree.
    #[must_use]
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Tags referenced by the expression, in source order.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.collect_tags(&mut out);
        out
    }

    /// Evaluate the expression against the given tags.
    pub fn evaluate<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set: HashSet<&'a str> = tags.into_iter().collect();
        self.root.eval(&set)
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

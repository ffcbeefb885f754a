//! Tag filters applied to scenarios and hooks.

use std::fmt;

use crate::ast::TagExpression;
use crate::error::TagExprError;

/// A parsed tag filter.
///
/// A filter consisting of exactly one `@name` token is stored as a plain
/// membership test and never reaches the expression parser.
///
/// # Examples
/// ```
/// use bddkit_tags::TagFilter;
///
/// let single = TagFilter::parse("@smoke").expect("valid filter");
/// assert!(matches!(single, TagFilter::Single(_)));
/// assert!(single.matches(["@smoke", "@cart"]));
///
/// let expr = TagFilter::parse("@smoke and not @wip").expect("valid filter");
/// assert!(!expr.matches(["@smoke", "@wip"]));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagFilter {
    /// Exactly one tag that must be present.
    Single(String),
    /// A full boolean expression.
    Expression(TagExpression),
}

fn single_tag(input: &str) -> Option<&str> {
    let name = input.strip_prefix('@')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-'));
    valid.then_some(input)
}

impl TagFilter {
    /// Parse a filter string.
    ///
    /// # Errors
    /// Returns [`TagExprError`] when the input is not a valid tag expression.
    pub fn parse(input: &str) -> Result<Self, TagExprError> {
        let trimmed = input.trim();
        single_tag(trimmed).map_or_else(
            || TagExpression::parse(trimmed).map(Self::Expression),
            |tag| Ok(Self::Single(tag.to_string())),
        )
    }

    /// Parse an optional filter, treating `None` and blank input as "no
    /// filter".
    ///
    /// # Errors
    /// Returns [`TagExprError`] when a non-blank input is invalid.
    pub fn parse_optional(input: Option<&str>) -> Result<Option<Self>, TagExprError> {
        input
            .filter(|text| !text.trim().is_empty())
            .map(Self::parse)
            .transpose()
    }

    /// Evaluate the filter against a tag set.
    pub fn matches<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Self::Single(tag) => tags.into_iter().any(|candidate| candidate == tag),
            Self::Expression(expr) => expr.evaluate(tags),
        }
    }

    /// Like [`matches`](Self::matches), but an empty tag set never satisfies
    /// the filter. Hook selection uses this form.
    pub fn matches_non_empty<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tags = tags.into_iter().peekable();
        tags.peek().is_some() && self.matches(tags)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(tag) => f.write_str(tag),
            Self::Expression(expr) => fmt::Display::fmt(expr, f),
        }
    }
}

/// Return `true` when `filter` is absent or accepts `tags`.
pub fn filter_accepts<'a, I>(filter: Option<&TagFilter>, tags: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    filter.is_none_or(|filter| filter.matches(tags))
}

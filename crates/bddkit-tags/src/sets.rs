//! Inheritance of tags from feature to rule to scenario to examples block.

use std::borrow::Cow;

/// Trim a tag and make sure it carries the leading `@`.
fn with_marker(tag: &str) -> Cow<'_, str> {
    let trimmed = tag.trim();
    if trimmed.starts_with('@') {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("@{trimmed}"))
    }
}

/// Effective tags of a child element: the parent's tags followed by the
/// child's own, first occurrence wins.
///
/// Both sides are normalised to carry a leading `@`; blank entries are
/// dropped.
///
/// # Examples
///
/// ```
/// use bddkit_tags::merge_tag_sets;
///
/// let feature = vec!["@fast".to_string(), "slow".to_string()];
/// let merged = merge_tag_sets(&feature, &["@fast", "web"]);
/// assert_eq!(merged, vec!["@fast", "@slow", "@web"]);
/// ```
#[must_use]
pub fn merge_tag_sets<S: AsRef<str>>(inherited: &[String], own: &[S]) -> Vec<String> {
    let parents = inherited.iter().map(String::as_str);
    let children = own.iter().map(AsRef::as_ref);
    parents
        .chain(children)
        .map(with_marker)
        .filter(|tag| tag.len() > 1)
        .fold(Vec::new(), |mut merged: Vec<String>, tag| {
            if !merged.iter().any(|seen| *seen == tag) {
                merged.push(tag.into_owned());
            }
            merged
        })
}

//! Edit distance used to rank step suggestions.

/// Case-insensitive Levenshtein distance between two strings, counted in
/// Unicode scalar values.
///
/// # Examples
/// ```
/// use bddkit_patterns::edit_distance;
///
/// assert_eq!(edit_distance("kitten", "sitting"), 3);
/// assert_eq!(edit_distance("Given", "given"), 0);
/// ```
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (row, ca) in a.iter().enumerate() {
        let mut current = Vec::with_capacity(previous.len());
        current.push(row + 1);
        for ((cb, diagonal), above) in b.iter().zip(&previous).zip(previous.iter().skip(1)) {
            let left = current.last().copied().unwrap_or(row + 1);
            let substitution = diagonal + usize::from(ca != cb);
            current.push((above + 1).min(left + 1).min(substitution));
        }
        previous = current;
    }
    previous.last().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "", 0)]
    #[case("", "abc", 3)]
    #[case("abc", "", 3)]
    #[case("flaw", "lawn", 2)]
    #[case("I have 3 items", "I have {int} items", 5)]
    #[case("CAFÉ", "café", 0)]
    fn computes_distance(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(edit_distance(a, b), expected);
    }

    #[test]
    fn is_symmetric() {
        assert_eq!(
            edit_distance("I log in", "I log out"),
            edit_distance("I log out", "I log in")
        );
    }
}

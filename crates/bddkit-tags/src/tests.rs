//! Coverage for tag-expression parsing and evaluation.
//!
//! Exercises happy paths, operator precedence, representative parse errors
//! and boolean laws over every small expression built from three tags.

use rstest::rstest;

use super::{TagExprErrorKind, TagExpression};

const TAGS: [&str; 3] = ["@a", "@b", "@c"];

fn parse_expression(input: &str) -> TagExpression {
    TagExpression::parse(input).unwrap_or_else(|err| panic!("parse expression `{input}`: {err}"))
}

fn parse_error(input: &str) -> super::TagExprError {
    match TagExpression::parse(input) {
        Ok(expr) => panic!("expected parse error for `{input}`, got {expr:?}"),
        Err(err) => err,
    }
}

/// Every subset of [`TAGS`].
fn tag_sets() -> Vec<Vec<&'static str>> {
    (0..1_u8 << TAGS.len())
        .map(|mask| {
            TAGS.iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, tag)| *tag)
                .collect()
        })
        .collect()
}

/// Expression sources of depth at most one over [`TAGS`].
fn small_expressions() -> Vec<String> {
    let mut out: Vec<String> = TAGS.iter().map(ToString::to_string).collect();
    for lhs in TAGS {
        out.push(format!("not {lhs}"));
        for rhs in TAGS {
            out.push(format!("{lhs} and {rhs}"));
            out.push(format!("{lhs} or {rhs}"));
        }
    }
    out
}

fn eval(source: &str, tags: &[&str]) -> bool {
    parse_expression(source).evaluate(tags.iter().copied())
}

#[test]
fn evaluates_simple_tag() {
    let expr = parse_expression("@fast");
    assert!(expr.evaluate(["@fast"]));
    assert!(!expr.evaluate(["@slow"]));
}

#[test]
fn parses_hyphenated_tag() {
    let expr = parse_expression("@smoke-tests");
    assert!(expr.evaluate(["@smoke-tests"]));
}

#[test]
fn parses_numeric_tag() {
    let expr = parse_expression("@123");
    assert!(expr.evaluate(["@123"]));
}

#[test]
fn membership_is_exact() {
    let expr = parse_expression("@smoke");
    assert!(!expr.evaluate(["@smoke-tests", "@Smoke"]));
}

#[test]
fn honours_operator_precedence() {
    let expr = parse_expression("@a or @b and @c");
    assert!(expr.evaluate(["@a"]));
    assert!(expr.evaluate(["@b", "@c"]));
    assert!(!expr.evaluate(["@b"]));
}

#[test]
fn parses_nested_parentheses() {
    let expr = parse_expression("not (@a or (@b))");
    assert!(!expr.evaluate(["@a"]));
    assert!(!expr.evaluate(["@b"]));
    assert!(expr.evaluate(["@c"]));
}

#[test]
fn allows_case_insensitive_operators() {
    let expr = parse_expression("@a Or nOt @b");
    assert!(expr.evaluate(["@a"]));
    assert!(expr.evaluate(["@c"]));
    assert!(!expr.evaluate(["@b"]));
}

#[test]
fn lists_referenced_tags() {
    let expr = parse_expression("@a and not (@b or @a)");
    assert_eq!(expr.tags(), vec!["@a", "@b", "@a"]);
}

#[rstest]
#[case("", TagExprErrorKind::Empty, 0, "empty tag expression")]
#[case("   ", TagExprErrorKind::Empty, 0, "empty tag expression")]
#[case("@a and", TagExprErrorKind::UnexpectedToken, 6, "expected tag or '(' after 'and'")]
#[case("@a && @b", TagExprErrorKind::UnexpectedCharacter, 3, "unexpected character '&'")]
#[case("@a @b", TagExprErrorKind::UnexpectedToken, 3, "unexpected token @b")]
#[case("@a xor @b", TagExprErrorKind::UnexpectedToken, 3, "unexpected identifier 'xor'")]
#[case("@", TagExprErrorKind::UnexpectedToken, 1, "expected tag name after '@'")]
#[case("(@a or @b", TagExprErrorKind::UnmatchedParenthesis, 0, "missing ')'")]
#[case("@a)", TagExprErrorKind::UnmatchedParenthesis, 2, "unmatched ')'")]
#[case("not", TagExprErrorKind::UnexpectedToken, 3, "expected tag or '(' after 'not'")]
fn reports_parse_errors(
    #[case] input: &str,
    #[case] kind: TagExprErrorKind,
    #[case] offset: usize,
    #[case] reason: &str,
) {
    let err = parse_error(input);
    assert_eq!(err.kind(), kind, "unexpected error: {err}");
    assert_eq!(err.offset(), offset, "unexpected error: {err}");
    assert_eq!(err.reason(), reason);
    assert!(err.to_string().starts_with("invalid tag expression at byte"));
}

#[test]
fn negation_inverts_every_small_expression() {
    for source in small_expressions() {
        for tags in tag_sets() {
            assert_eq!(
                eval(&format!("not ({source})"), &tags),
                !eval(&source, &tags),
                "not ({source}) over {tags:?}"
            );
        }
    }
}

#[test]
fn conjunction_and_de_morgan_hold_for_small_expressions() {
    let expressions = small_expressions();
    let sets = tag_sets();
    for lhs in &expressions {
        for rhs in &expressions {
            for tags in &sets {
                let l = eval(lhs, tags);
                let r = eval(rhs, tags);
                assert_eq!(eval(&format!("({lhs}) and ({rhs})"), tags), l && r);
                assert_eq!(
                    eval(&format!("not (({lhs}) and ({rhs}))"), tags),
                    eval(&format!("not ({lhs}) or not ({rhs})"), tags),
                    "De Morgan (and) for {lhs} / {rhs} over {tags:?}"
                );
                assert_eq!(
                    eval(&format!("not (({lhs}) or ({rhs}))"), tags),
                    eval(&format!("not ({lhs}) and not ({rhs})"), tags),
                    "De Morgan (or) for {lhs} / {rhs} over {tags:?}"
                );
            }
        }
    }
}

#[test]
fn display_reparses_to_the_same_tree() {
    for source in small_expressions() {
        let expr = parse_expression(&format!("not ({source}) or @c and {source}"));
        assert_eq!(parse_expression(&expr.to_string()), expr);
    }
}

//! Convert lexed tokens into anchored regular-expression sources.

use crate::errors::{PatternError, SyntaxFault};
use crate::params::{ParameterType, ParameterTypes};

use super::lexer::{Token, lex_pattern};

/// Parameter bound to a placeholder in a compiled pattern.
#[derive(Debug, Clone)]
pub struct PatternParameter {
    label: String,
    parameter_type: ParameterType,
    group: usize,
}

impl PatternParameter {
    /// Label of the placeholder (`count` in `{count:int}`).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parameter type applied to the capture.
    #[must_use]
    pub fn parameter_type(&self) -> &ParameterType {
        &self.parameter_type
    }

    /// Index of the capture group holding the value.
    #[must_use]
    pub fn group(&self) -> usize {
        self.group
    }
}

/// Output of compiling a placeholder pattern.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSource {
    pub regex: String,
    pub parameters: Vec<PatternParameter>,
    pub rendering: String,
}

/// Build an anchored regular expression from a placeholder pattern.
///
/// Literal text is escaped; each placeholder is replaced by its parameter
/// type's fragment. Placeholders naming an unknown type capture greedily and
/// keep their label.
///
/// # Errors
/// Returns [`PatternError`] when the pattern holds malformed placeholders or
/// unbalanced braces.
///
/// # Examples
/// ```
/// use bddkit_patterns::{build_regex_from_pattern, ParameterTypes};
///
/// let regex = build_regex_from_pattern("I have {int} cukes", &ParameterTypes::default())
///     .expect("pattern compiles");
/// assert_eq!(regex, r"^I have ([-+]?\d+) cukes$");
/// ```
pub fn build_regex_from_pattern(
    pat: &str,
    types: &ParameterTypes,
) -> Result<String, PatternError> {
    compile_source(pat, types).map(|compiled| compiled.regex)
}

pub(crate) fn compile_source(
    pat: &str,
    types: &ParameterTypes,
) -> Result<CompiledSource, PatternError> {
    let tokens = lex_pattern(pat)?;
    let mut regex = String::with_capacity(pat.len().saturating_mul(2) + 2);
    let mut rendering = String::with_capacity(pat.len());
    let mut parameters = Vec::new();
    let mut next_group = 1usize;
    let mut stray_depth = 0usize;
    regex.push('^');

    for token in tokens {
        match token {
            Token::Literal(text) => {
                regex.push_str(&regex::escape(&text));
                rendering.push_str(&text);
            }
            Token::Placeholder {
                label, type_name, ..
            } => {
                let parameter_type = types
                    .get(&type_name)
                    .cloned()
                    .unwrap_or_else(|| ParameterTypes::fallback(&type_name));
                regex.push_str(parameter_type.fragment());
                rendering.push('{');
                rendering.push_str(&label);
                rendering.push('}');
                let group = next_group;
                next_group += parameter_type.groups();
                parameters.push(PatternParameter {
                    label,
                    parameter_type,
                    group,
                });
            }
            Token::OpenBrace { .. } => {
                stray_depth = stray_depth.saturating_add(1);
                regex.push_str(&regex::escape("{"));
                rendering.push('{');
            }
            Token::CloseBrace { index } => {
                if stray_depth == 0 {
                    return Err(PatternError::syntax(SyntaxFault::UnmatchedClose, index, None));
                }
                stray_depth -= 1;
                regex.push_str(&regex::escape("}"));
                rendering.push('}');
            }
        }
    }

    if stray_depth != 0 {
        return Err(PatternError::syntax(
            SyntaxFault::UnbalancedBraces,
            pat.len(),
            None,
        ));
    }

    regex.push('$');
    Ok(CompiledSource {
        regex,
        parameters,
        rendering,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::StepArg;

    fn compile(pat: &str) -> CompiledSource {
        compile_source(pat, &ParameterTypes::default())
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"))
    }

    #[test]
    fn builds_regex_for_builtin_types() {
        let compiled = compile("I am on {string} with {word}");
        assert_eq!(compiled.regex, r#"^I am on "([^"]*)" with (\S+)$"#);
        assert_eq!(compiled.rendering, "I am on {string} with {word}");
    }

    #[test]
    fn unknown_types_fall_back_to_greedy_capture() {
        let compiled = compile("the {colour} door");
        assert_eq!(compiled.regex, "^the (.*) door$");
        let labels: Vec<_> = compiled.parameters.iter().map(PatternParameter::label).collect();
        assert_eq!(labels, vec!["colour"]);
    }

    #[test]
    fn group_indices_skip_nested_custom_groups() {
        let mut types = ParameterTypes::default();
        let range = ParameterType::new("range", r"(\d+)-(\d+)", |text| {
            Ok(StepArg::Text(text.to_string()))
        })
        .unwrap_or_else(|err| panic!("fragment should compile: {err}"));
        types.register(range);
        let compiled = compile_source("from {range} take {int}", &types)
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        let groups: Vec<_> = compiled.parameters.iter().map(PatternParameter::group).collect();
        assert_eq!(groups, vec![1, 4]);
    }

    #[test]
    fn errors_when_closing_brace_unmatched() {
        let Err(err) = compile_source("broken}", &ParameterTypes::default()) else {
            panic!("should fail");
        };
        assert!(
            err.to_string()
                .contains("unmatched closing brace '}' in step pattern")
        );
    }

    #[test]
    fn errors_when_open_braces_remain() {
        let Err(err) = compile_source("{ open", &ParameterTypes::default()) else {
            panic!("should fail");
        };
        assert!(err.to_string().contains("unbalanced braces"));
    }
}

//! Step-pattern lexing, compilation and matching.

mod compiler;
mod lexer;
mod placeholder;

use std::fmt;

use regex::Regex;

use crate::errors::PatternError;
use crate::params::{ParameterTypes, StepArg};

pub use compiler::{PatternParameter, build_regex_from_pattern};

/// Original text a [`StepPattern`] was compiled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSource {
    /// A string with `{name}` placeholders.
    Text(String),
    /// A raw regular expression, used as written.
    Regex(String),
}

impl PatternSource {
    /// Borrow the source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Regex(text) => text,
        }
    }
}

impl fmt::Display for PatternSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Regex(source) => write!(f, "/{source}/"),
        }
    }
}

/// A compiled step pattern.
///
/// # Examples
/// ```
/// use bddkit_patterns::{ParameterTypes, StepArg, StepPattern};
///
/// let pattern = StepPattern::compile("I have {int} items", &ParameterTypes::default())
///     .expect("pattern compiles");
/// let args = pattern.match_text("I have 3 items").expect("matches").expect("converts");
/// assert_eq!(args, vec![StepArg::Int(3)]);
/// assert!(pattern.match_text("I have three items").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct StepPattern {
    source: PatternSource,
    regex: Regex,
    parameters: Vec<PatternParameter>,
    rendering: String,
}

impl StepPattern {
    /// Compile a placeholder pattern against the given parameter types.
    ///
    /// # Errors
    /// Returns [`PatternError`] when placeholder parsing fails or the
    /// generated regex source cannot be compiled.
    pub fn compile(pattern: &str, types: &ParameterTypes) -> Result<Self, PatternError> {
        let compiled = compiler::compile_source(pattern, types)?;
        let regex = Regex::new(&compiled.regex)?;
        Ok(Self {
            source: PatternSource::Text(pattern.to_string()),
            regex,
            parameters: compiled.parameters,
            rendering: compiled.rendering,
        })
    }

    /// Wrap a raw regular expression. Every capture group yields a
    /// [`StepArg::Text`] argument.
    ///
    /// # Errors
    /// Returns [`PatternError::Regex`] when the source does not compile.
    pub fn from_regex(source: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(source)?;
        Ok(Self::from_compiled(regex))
    }

    /// Wrap an already compiled regular expression.
    #[must_use]
    pub fn from_compiled(regex: Regex) -> Self {
        let source = regex.as_str().to_string();
        let unanchored = source.strip_prefix('^').unwrap_or(&source);
        let rendering = unanchored
            .strip_suffix('$')
            .unwrap_or(unanchored)
            .to_string();
        Self {
            source: PatternSource::Regex(source),
            regex,
            parameters: Vec::new(),
            rendering,
        }
    }

    /// The text the pattern was built from.
    #[must_use]
    pub fn source(&self) -> &PatternSource {
        &self.source
    }

    /// The compiled regular expression.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Source of the compiled regular expression, used for duplicate
    /// detection.
    #[must_use]
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameters bound to placeholders, in pattern order. Empty for raw
    /// regular expressions.
    #[must_use]
    pub fn parameters(&self) -> &[PatternParameter] {
        &self.parameters
    }

    /// Placeholder labels in pattern order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(PatternParameter::label)
    }

    /// Human-readable rendering compared against step text when ranking
    /// suggestions.
    #[must_use]
    pub fn rendering(&self) -> &str {
        &self.rendering
    }

    /// Match `text` and convert the captures.
    ///
    /// Returns `None` when the text does not match. A match whose captures
    /// fail to convert yields `Some(Err(..))`.
    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<Result<Vec<StepArg>, PatternError>> {
        let captures = self.regex.captures(text)?;
        if matches!(self.source, PatternSource::Regex(_)) {
            // Groups that did not participate still take a position.
            let groups = captures.iter().skip(1);
            return Some(Ok(groups
                .map(|group| StepArg::Text(group.map_or_else(String::new, |m| m.as_str().into())))
                .collect()));
        }
        Some(
            self.parameters
                .iter()
                .map(|parameter| {
                    let value = captures
                        .get(parameter.group())
                        .map_or("", |matched| matched.as_str());
                    parameter
                        .parameter_type()
                        .transform(value)
                        .map_err(|reason| PatternError::Transform {
                            parameter: parameter.label().to_string(),
                            type_name: parameter.parameter_type().name().to_string(),
                            value: value.to_string(),
                            reason,
                        })
                })
                .collect(),
        )
    }
}

/// Build and compile a regular expression from a step pattern.
///
/// # Errors
/// Returns [`PatternError`] when placeholder parsing fails or the generated
/// regex source cannot be compiled.
pub fn compile_regex_from_pattern(
    pat: &str,
    types: &ParameterTypes,
) -> Result<Regex, PatternError> {
    let source = build_regex_from_pattern(pat, types)?;
    Regex::new(&source).map_err(PatternError::from)
}

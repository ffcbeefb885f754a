//! Permissive, multilingual feature-file parser.
//!
//! [`parse`] turns feature-file text into a [`Document`] tree plus a list of
//! [`Diagnostic`]s describing anything that was skipped. Only a malformed
//! tag aborts parsing. [`parse_strict`] promotes every diagnostic to an
//! error. [`render_document`] writes a tree back out as text.
//!
//! Keywords come from a [`Dialect`], selected by a `# language: <code>`
//! comment among the leading lines and defaulting to English. English,
//! French, German and Spanish are built in; more can be added through a
//! [`DialectRegistry`].

mod ast;
mod dialect;
mod error;
mod parser;
mod render;
mod table;

pub use ast::{
    Background, Comment, DataTable, DocString, DocStringDelimiter, Document, Examples, Feature,
    FeatureChild, Rule, RuleChild, Scenario, ScenarioKind, Step, TableRow, Tag,
};
pub use bddkit_patterns::KeywordRole;
pub use dialect::{Dialect, DialectRegistry, StructuralKeyword};
pub use error::{Diagnostic, DiagnosticKind, ParseError};
pub use render::render_document;

use parser::{LineParser, detect_language};

/// Output of a permissive parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// The document tree.
    pub document: Document,
    /// Constructs that were skipped or look suspicious.
    pub diagnostics: Vec<Diagnostic>,
}

/// Configurable parser front end.
///
/// # Examples
/// ```
/// use bddkit_gherkin::FeatureParser;
///
/// let parser = FeatureParser::new()
///     .with_default_language("fr")
///     .with_source("panier.feature");
/// let parsed = parser
///     .parse("Fonctionnalité: Panier\n  Scénario: vide\n    Soit un panier vide\n")
///     .expect("parses");
/// assert_eq!(parsed.document.language, "fr");
/// assert_eq!(parsed.document.source.as_deref(), Some("panier.feature"));
/// ```
#[derive(Debug, Clone)]
pub struct FeatureParser {
    dialects: DialectRegistry,
    default_language: String,
    source: Option<String>,
}

impl Default for FeatureParser {
    fn default() -> Self {
        Self {
            dialects: DialectRegistry::default(),
            default_language: "en".to_string(),
            source: None,
        }
    }
}

impl FeatureParser {
    /// Create a parser with the built-in dialects and English as default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dialect registry.
    #[must_use]
    pub fn with_dialects(mut self, dialects: DialectRegistry) -> Self {
        self.dialects = dialects;
        self
    }

    /// Set the dialect used when a document has no language directive.
    #[must_use]
    pub fn with_default_language(mut self, code: impl Into<String>) -> Self {
        self.default_language = code.into();
        self
    }

    /// Set the source identifier recorded on parsed documents.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Mutable access to the dialect registry.
    pub fn dialects_mut(&mut self) -> &mut DialectRegistry {
        &mut self.dialects
    }

    /// Parse `text`, collecting diagnostics for skipped constructs.
    ///
    /// # Errors
    /// Returns [`ParseError::MalformedTag`] for tag lines holding a token that
    /// is not a tag, and [`ParseError::UnknownDialect`] when the default
    /// language is not registered.
    pub fn parse(&self, text: &str) -> Result<Parsed, ParseError> {
        let fallback = self
            .dialects
            .get(&self.default_language)
            .ok_or_else(|| ParseError::UnknownDialect(self.default_language.clone()))?;
        let directive = detect_language(text);
        let known = directive.and_then(|(code, _)| self.dialects.get(code));
        let dialect = known.unwrap_or(fallback);

        let mut line_parser = LineParser::new(dialect.code());
        if let Some((_, line)) = directive.filter(|_| known.is_some()) {
            line_parser = line_parser.with_directive_line(line);
        }
        if let Some((code, line)) = directive.filter(|_| known.is_none()) {
            line_parser.push_diagnostic(
                DiagnosticKind::UnknownLanguage,
                line,
                format!(
                    "unknown language `{code}`; using `{}`",
                    self.default_language
                ),
            );
        }
        let (document, diagnostics) =
            line_parser.run(&dialect.matcher(), text, self.source.clone())?;
        for diagnostic in &diagnostics {
            tracing::warn!(
                source = document.source.as_deref().unwrap_or("<inline>"),
                line = diagnostic.line,
                kind = ?diagnostic.kind,
                "{}",
                diagnostic.message
            );
        }
        Ok(Parsed {
            document,
            diagnostics,
        })
    }

    /// Parse `text`, treating any diagnostic as an error.
    ///
    /// # Errors
    /// Returns the errors of [`parse`](Self::parse), or
    /// [`ParseError::Diagnostics`] when any construct was skipped.
    pub fn parse_strict(&self, text: &str) -> Result<Document, ParseError> {
        let Parsed {
            document,
            diagnostics,
        } = self.parse(text)?;
        if diagnostics.is_empty() {
            Ok(document)
        } else {
            Err(ParseError::Diagnostics(diagnostics))
        }
    }
}

/// Parse `text` with the built-in dialects.
///
/// # Errors
/// See [`FeatureParser::parse`].
///
/// # Examples
/// ```
/// use bddkit_gherkin::{parse, KeywordRole};
///
/// let parsed = parse(
///     "Feature: Login\n  Scenario: ok\n    Given a user\n    And a password\n",
/// )
/// .expect("parses");
/// let scenario = parsed.document.scenarios().next().expect("one scenario");
/// assert_eq!(scenario.steps[1].role, KeywordRole::Conjunction);
/// assert!(parsed.diagnostics.is_empty());
/// ```
pub fn parse(text: &str) -> Result<Parsed, ParseError> {
    FeatureParser::new().parse(text)
}

/// Parse `text` with the built-in dialects, rejecting any diagnostic.
///
/// # Errors
/// See [`FeatureParser::parse_strict`].
pub fn parse_strict(text: &str) -> Result<Document, ParseError> {
    FeatureParser::new().parse_strict(text)
}

//! Keyword dialects.
//!
//! A [`Dialect`] maps structural and step keywords of one natural language
//! to their literal tokens. The parser never hard-codes keywords apart from
//! the `*` bullet, so further languages only need a new [`Dialect`]
//! registered with a [`DialectRegistry`].

use std::collections::HashMap;

use bddkit_patterns::KeywordRole;

/// Structural keyword categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKeyword {
    /// `Feature:`
    Feature,
    /// `Rule:`
    Rule,
    /// `Background:`
    Background,
    /// `Scenario:` / `Example:`
    Scenario,
    /// `Scenario Outline:` / `Scenario Template:`
    ScenarioOutline,
    /// `Examples:`
    Examples,
}

/// Keyword tokens for one language.
///
/// # Examples
/// ```
/// use bddkit_gherkin::Dialect;
///
/// let dialect = Dialect::new("pirate", "Pirate")
///     .with_feature(["Ahoy matey!"])
///     .with_scenario(["Heave to"])
///     .with_given(["Gangway!"]);
/// assert_eq!(dialect.code(), "pirate");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dialect {
    code: String,
    name: String,
    feature: Vec<String>,
    rule: Vec<String>,
    background: Vec<String>,
    scenario: Vec<String>,
    scenario_outline: Vec<String>,
    examples: Vec<String>,
    given: Vec<String>,
    when: Vec<String>,
    then: Vec<String>,
    and: Vec<String>,
    but: Vec<String>,
}

fn owned<const N: usize>(tokens: [&str; N]) -> Vec<String> {
    tokens.iter().map(ToString::to_string).collect()
}

macro_rules! keyword_setter {
    ($(#[$meta:meta])* $setter:ident, $field:ident) => {
        $(#[$meta])*
        #[must_use]
        pub fn $setter<const N: usize>(mut self, tokens: [&str; N]) -> Self {
            self.$field = owned(tokens);
            self
        }
    };
}

impl Dialect {
    /// Create a dialect without keywords.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    keyword_setter!(
        /// Set the `Feature` tokens.
        with_feature, feature
    );
    keyword_setter!(
        /// Set the `Rule` tokens.
        with_rule, rule
    );
    keyword_setter!(
        /// Set the `Background` tokens.
        with_background, background
    );
    keyword_setter!(
        /// Set the `Scenario` tokens.
        with_scenario, scenario
    );
    keyword_setter!(
        /// Set the `Scenario Outline` tokens.
        with_scenario_outline, scenario_outline
    );
    keyword_setter!(
        /// Set the `Examples` tokens.
        with_examples, examples
    );
    keyword_setter!(
        /// Set the `Given` tokens.
        with_given, given
    );
    keyword_setter!(
        /// Set the `When` tokens.
        with_when, when
    );
    keyword_setter!(
        /// Set the `Then` tokens.
        with_then, then
    );
    keyword_setter!(
        /// Set the `And` tokens.
        with_and, and
    );
    keyword_setter!(
        /// Set the `But` tokens.
        with_but, but
    );

    /// Language code, e.g. `en`.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable language name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// English keywords.
    #[must_use]
    pub fn english() -> Self {
        Self::new("en", "English")
            .with_feature(["Feature", "Business Need", "Ability"])
            .with_rule(["Rule"])
            .with_background(["Background"])
            .with_scenario(["Example", "Scenario"])
            .with_scenario_outline(["Scenario Outline", "Scenario Template"])
            .with_examples(["Examples", "Scenarios"])
            .with_given(["Given"])
            .with_when(["When"])
            .with_then(["Then"])
            .with_and(["And"])
            .with_but(["But"])
    }

    /// French keywords.
    #[must_use]
    pub fn french() -> Self {
        Self::new("fr", "French")
            .with_feature(["Fonctionnalité"])
            .with_rule(["Règle"])
            .with_background(["Contexte"])
            .with_scenario(["Exemple", "Scénario"])
            .with_scenario_outline(["Plan du scénario", "Plan du Scénario"])
            .with_examples(["Exemples"])
            .with_given([
                "Soit",
                "Sachant que",
                "Sachant qu'",
                "Sachant",
                "Etant donné que",
                "Etant donné qu'",
                "Etant donné",
                "Etant donnée",
                "Etant donnés",
                "Etant données",
                "Étant donné que",
                "Étant donné qu'",
                "Étant donné",
                "Étant donnée",
                "Étant donnés",
                "Étant données",
            ])
            .with_when(["Quand", "Lorsque", "Lorsqu'"])
            .with_then(["Alors", "Donc"])
            .with_and(["Et que", "Et qu'", "Et"])
            .with_but(["Mais que", "Mais qu'", "Mais"])
    }

    /// German keywords.
    #[must_use]
    pub fn german() -> Self {
        Self::new("de", "German")
            .with_feature(["Funktionalität", "Funktion"])
            .with_rule(["Rule", "Regel"])
            .with_background(["Grundlage", "Hintergrund", "Voraussetzungen", "Vorbedingungen"])
            .with_scenario(["Beispiel", "Szenario"])
            .with_scenario_outline(["Szenariogrundriss", "Szenarien"])
            .with_examples(["Beispiele"])
            .with_given(["Angenommen", "Gegeben sei", "Gegeben seien"])
            .with_when(["Wenn"])
            .with_then(["Dann"])
            .with_and(["Und"])
            .with_but(["Aber"])
    }

    /// Spanish keywords.
    #[must_use]
    pub fn spanish() -> Self {
        Self::new("es", "Spanish")
            .with_feature(["Característica", "Necesidad del negocio", "Requisito"])
            .with_rule(["Regla", "Regla de negocio"])
            .with_background(["Antecedentes"])
            .with_scenario(["Ejemplo", "Escenario"])
            .with_scenario_outline(["Esquema del escenario"])
            .with_examples(["Ejemplos"])
            .with_given(["Dado", "Dada", "Dados", "Dadas"])
            .with_when(["Cuando"])
            .with_then(["Entonces"])
            .with_and(["Y", "E"])
            .with_but(["Pero"])
    }

    /// Compile the keyword tables used while scanning lines.
    pub(crate) fn matcher(&self) -> KeywordMatcher {
        let mut structural: Vec<(String, StructuralKeyword)> = [
            (&self.feature, StructuralKeyword::Feature),
            (&self.rule, StructuralKeyword::Rule),
            (&self.background, StructuralKeyword::Background),
            (&self.scenario, StructuralKeyword::Scenario),
            (&self.scenario_outline, StructuralKeyword::ScenarioOutline),
            (&self.examples, StructuralKeyword::Examples),
        ]
        .into_iter()
        .flat_map(|(tokens, kind)| tokens.iter().map(move |token| (token.clone(), kind)))
        .collect();
        let mut steps: Vec<(String, KeywordRole)> = [
            (&self.given, KeywordRole::Context),
            (&self.when, KeywordRole::Action),
            (&self.then, KeywordRole::Outcome),
            (&self.and, KeywordRole::Conjunction),
            (&self.but, KeywordRole::Conjunction),
        ]
        .into_iter()
        .flat_map(|(tokens, role)| tokens.iter().map(move |token| (token.clone(), role)))
        .collect();
        structural.sort_by_key(|(token, _)| std::cmp::Reverse(token.chars().count()));
        steps.sort_by_key(|(token, _)| std::cmp::Reverse(token.chars().count()));
        KeywordMatcher { structural, steps }
    }
}

/// Keyword tokens ordered longest first so `Scenario Outline` wins over
/// `Scenario`.
#[derive(Debug, Clone)]
pub(crate) struct KeywordMatcher {
    structural: Vec<(String, StructuralKeyword)>,
    steps: Vec<(String, KeywordRole)>,
}

/// Result of matching a structural header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeaderMatch<'a> {
    pub kind: StructuralKeyword,
    pub keyword: &'a str,
    pub name: &'a str,
}

/// Result of matching a step line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StepMatch<'a> {
    pub role: KeywordRole,
    pub keyword: &'a str,
    pub text: &'a str,
}

impl KeywordMatcher {
    /// Match `<Keyword>: <name>` on a trimmed line.
    pub(crate) fn header<'a>(&'a self, line: &'a str) -> Option<HeaderMatch<'a>> {
        self.structural.iter().find_map(|(token, kind)| {
            let name = line.strip_prefix(token.as_str())?.strip_prefix(':')?;
            Some(HeaderMatch {
                kind: *kind,
                keyword: token,
                name: name.trim(),
            })
        })
    }

    /// Match a step token on a trimmed line.
    ///
    /// Tokens must be followed by whitespace unless they end with an
    /// apostrophe (`qu'il`). A leading `* ` always yields
    /// [`KeywordRole::Unknown`].
    pub(crate) fn step<'a>(&'a self, line: &'a str) -> Option<StepMatch<'a>> {
        if let Some(rest) = line
            .strip_prefix('*')
            .filter(|rest| rest.starts_with(char::is_whitespace))
        {
            return Some(StepMatch {
                role: KeywordRole::Unknown,
                keyword: "*",
                text: rest.trim(),
            });
        }
        self.steps.iter().find_map(|(token, role)| {
            let rest = line.strip_prefix(token.as_str())?;
            let text = if token.ends_with('\'') {
                rest
            } else if rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                return None;
            };
            Some(StepMatch {
                role: *role,
                keyword: token,
                text: text.trim_end(),
            })
        })
    }
}

/// Registry of dialects addressed by language code.
///
/// # Examples
/// ```
/// use bddkit_gherkin::{Dialect, DialectRegistry};
///
/// let mut registry = DialectRegistry::default();
/// assert!(registry.get("fr").is_some());
/// registry.register(Dialect::new("xx", "Test").with_feature(["Thing"]));
/// assert!(registry.get("xx").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<String, Dialect>,
}

impl Default for DialectRegistry {
    fn default() -> Self {
        let mut registry = Self {
            dialects: HashMap::new(),
        };
        for dialect in [
            Dialect::english(),
            Dialect::french(),
            Dialect::german(),
            Dialect::spanish(),
        ] {
            registry.register(dialect);
        }
        registry
    }
}

impl DialectRegistry {
    /// Create a registry holding the built-in dialects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dialect.
    pub fn register(&mut self, dialect: Dialect) {
        self.dialects.insert(dialect.code().to_string(), dialect);
    }

    /// Look up a dialect by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Dialect> {
        self.dialects.get(code)
    }

    /// Registered language codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Scenario Outline: eat", StructuralKeyword::ScenarioOutline, "eat")]
    #[case("Scenario: eat", StructuralKeyword::Scenario, "eat")]
    #[case("Feature:", StructuralKeyword::Feature, "")]
    #[case("Examples:  first  ", StructuralKeyword::Examples, "first")]
    fn matches_english_headers(
        #[case] line: &str,
        #[case] kind: StructuralKeyword,
        #[case] name: &str,
    ) {
        let matcher = Dialect::english().matcher();
        let header = matcher
            .header(line)
            .unwrap_or_else(|| panic!("{line:?} should be a header"));
        assert_eq!(header.kind, kind);
        assert_eq!(header.name, name);
    }

    #[test]
    fn headers_require_a_colon() {
        let matcher = Dialect::english().matcher();
        assert!(matcher.header("Scenario outline without colon").is_none());
    }

    #[rstest]
    #[case("Given I am here", KeywordRole::Context, "Given", "I am here")]
    #[case("And then some", KeywordRole::Conjunction, "And", "then some")]
    #[case("* a bullet", KeywordRole::Unknown, "*", "a bullet")]
    fn matches_english_steps(
        #[case] line: &str,
        #[case] role: KeywordRole,
        #[case] keyword: &str,
        #[case] text: &str,
    ) {
        let matcher = Dialect::english().matcher();
        let step = matcher
            .step(line)
            .unwrap_or_else(|| panic!("{line:?} should be a step"));
        assert_eq!((step.role, step.keyword, step.text), (role, keyword, text));
    }

    #[rstest]
    #[case("Givenness matters")]
    #[case("Andrew is here")]
    #[case("*bold*")]
    fn step_tokens_need_a_following_space(#[case] line: &str) {
        assert!(Dialect::english().matcher().step(line).is_none());
    }

    #[test]
    fn apostrophe_tokens_need_no_space() {
        let matcher = Dialect::french().matcher();
        let step = matcher
            .step("Lorsqu'il pleut")
            .unwrap_or_else(|| panic!("apostrophe token should match"));
        assert_eq!(step.keyword, "Lorsqu'");
        assert_eq!(step.text, "il pleut");
        assert_eq!(step.role, KeywordRole::Action);
    }

    #[test]
    fn longest_step_token_wins() {
        let matcher = Dialect::french().matcher();
        let step = matcher
            .step("Etant donné que je suis connecté")
            .unwrap_or_else(|| panic!("step should match"));
        assert_eq!(step.keyword, "Etant donné que");
        assert_eq!(step.text, "je suis connecté");
    }

    #[test]
    fn registry_lists_builtin_codes() {
        assert_eq!(DialectRegistry::new().codes(), vec!["de", "en", "es", "fr"]);
    }
}

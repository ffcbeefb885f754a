//! Step registration and lookup.
//!
//! A [`StepRegistry`] owns the step definitions for one world type together
//! with the parameter types its patterns are compiled against. Patterns are
//! compiled when registered, so lookups only run the anchored regexes in
//! registration order.

use std::fmt;
use std::sync::Arc;

use bddkit_patterns::{
    ParameterType, ParameterTypes, PatternError, PatternSource, Registration, StepArg,
    StepPattern, StepRole, edit_distance,
};
use bddkit_tags::{TagExprError, TagFilter};
use thiserror::Error;
use tracing::warn;

use crate::HandlerFuture;
use crate::context::StepContext;

/// Handler stored for a step definition.
pub type StepHandler<W> =
    Arc<dyn for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync>;

/// Errors raised while registering step definitions.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A definition with the same compiled pattern and role already exists.
    #[error("duplicate step definition for {role} `{pattern}`")]
    Duplicate {
        /// Pattern as written.
        pattern: String,
        /// Role of both definitions.
        role: StepRole,
    },
    /// The pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// The tag scope is not a valid tag expression.
    #[error("invalid tag scope: {0}")]
    InvalidTagScope(#[from] TagExprError),
}

/// A registered step definition.
pub struct StepDefinition<W> {
    pattern: StepPattern,
    role: StepRole,
    tag_scope: Option<TagFilter>,
    handler: StepHandler<W>,
}

impl<W> StepDefinition<W> {
    /// Compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    /// Role the definition was registered under.
    #[must_use]
    pub fn role(&self) -> StepRole {
        self.role
    }

    /// Tags a scenario must carry for this definition to apply.
    #[must_use]
    pub fn tag_scope(&self) -> Option<&TagFilter> {
        self.tag_scope.as_ref()
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &StepHandler<W> {
        &self.handler
    }

    fn is_duplicate_of(&self, other: &StepPattern, role: StepRole) -> bool {
        self.role == role && self.pattern.regex_source() == other.regex_source()
    }
}

impl<W> Clone for StepDefinition<W> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            role: self.role,
            tag_scope: self.tag_scope.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<W> fmt::Debug for StepDefinition<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.pattern.source().as_str())
            .field("role", &self.role)
            .field("tag_scope", &self.tag_scope)
            .finish_non_exhaustive()
    }
}

/// A definition matched against a step, with the converted arguments.
#[derive(Debug)]
pub struct StepMatch<'r, W> {
    /// The matching definition.
    pub definition: &'r StepDefinition<W>,
    /// Captured arguments in placeholder order.
    pub args: Vec<StepArg>,
}

impl<W> StepMatch<'_, W> {
    /// Placeholder labels of the matching pattern.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.definition
            .pattern
            .parameter_names()
            .map(str::to_string)
            .collect()
    }
}

/// A registered pattern close to an undefined step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Human-readable pattern rendering.
    pub pattern: String,
    /// Role of the suggested definition.
    pub role: StepRole,
    /// Case-insensitive edit distance to the step text.
    pub distance: usize,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.pattern)
    }
}

/// Step definitions for worlds of type `W`.
pub struct StepRegistry<W> {
    definitions: Vec<StepDefinition<W>>,
    parameter_types: ParameterTypes,
}

impl<W> Default for StepRegistry<W> {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            parameter_types: ParameterTypes::new(),
        }
    }
}

impl<W> Clone for StepRegistry<W> {
    fn clone(&self) -> Self {
        Self {
            definitions: self.definitions.clone(),
            parameter_types: self.parameter_types.clone(),
        }
    }
}

impl<W> fmt::Debug for StepRegistry<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("definitions", &self.definitions)
            .field("parameter_types", &self.parameter_types)
            .finish()
    }
}

impl<W> StepRegistry<W> {
    /// Create an empty registry with the built-in parameter types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `Given` step.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn given<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.register(StepRole::Given, pattern, handler)
    }

    /// Register a `When` step.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn when<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.register(StepRole::When, pattern, handler)
    }

    /// Register a `Then` step.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn then<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.register(StepRole::Then, pattern, handler)
    }

    /// Register a step matching every role.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn step<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.register(StepRole::Any, pattern, handler)
    }

    /// Compile a placeholder pattern and register it under `role`.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile
    /// and [`RegistryError::Duplicate`] when a definition with the same
    /// compiled pattern and role exists.
    pub fn register<F>(
        &mut self,
        role: StepRole,
        pattern: &str,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.register_with(role, pattern, None, handler)
    }

    /// Like [`register`](Self::register), restricted to scenarios whose
    /// effective tags satisfy `tag_scope`.
    ///
    /// # Errors
    /// Additionally returns [`RegistryError::InvalidTagScope`] for a
    /// malformed scope.
    pub fn register_with<F>(
        &mut self,
        role: StepRole,
        pattern: &str,
        tag_scope: Option<&str>,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        let compiled = StepPattern::compile(pattern, &self.parameter_types)?;
        let tag_scope = TagFilter::parse_optional(tag_scope)?;
        self.insert(role, compiled, tag_scope, Arc::new(handler))
    }

    /// Register a raw regular expression, used as written.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] for an invalid regex and
    /// [`RegistryError::Duplicate`] for a repeated one.
    pub fn register_regex<F>(
        &mut self,
        role: StepRole,
        regex: &str,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: for<'a> Fn(&'a mut W, &'a mut StepContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        let compiled = StepPattern::from_regex(regex)?;
        self.insert(role, compiled, None, Arc::new(handler))
    }

    fn insert(
        &mut self,
        role: StepRole,
        pattern: StepPattern,
        tag_scope: Option<TagFilter>,
        handler: StepHandler<W>,
    ) -> Result<&mut Self, RegistryError> {
        if self
            .definitions
            .iter()
            .any(|existing| existing.is_duplicate_of(&pattern, role))
        {
            return Err(RegistryError::Duplicate {
                pattern: pattern.source().as_str().to_string(),
                role,
            });
        }
        self.definitions.push(StepDefinition {
            pattern,
            role,
            tag_scope,
            handler,
        });
        Ok(self)
    }

    /// Register a custom parameter type.
    ///
    /// Placeholder patterns already registered are recompiled so that
    /// placeholders naming the type pick up its fragment and transform.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when a recompiled pattern no longer
    /// compiles. The type stays registered; the affected definition keeps its
    /// previous compilation.
    pub fn define_parameter_type(
        &mut self,
        parameter: ParameterType,
    ) -> Result<Registration, RegistryError> {
        let name = parameter.name().to_string();
        let registration = self.parameter_types.register(parameter);
        if registration == Registration::ShadowsBuiltin {
            warn!(
                parameter_type = %name,
                "custom parameter type shadows a built-in; the built-in still wins"
            );
        }
        let mut first_error = None;
        for definition in &mut self.definitions {
            let PatternSource::Text(text) = definition.pattern.source() else {
                continue;
            };
            if !definition
                .pattern
                .parameters()
                .iter()
                .any(|parameter| parameter.parameter_type().name() == name)
            {
                continue;
            }
            match StepPattern::compile(text, &self.parameter_types) {
                Ok(recompiled) => definition.pattern = recompiled,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(registration), |err| Err(err.into()))
    }

    /// Parameter types patterns are compiled against.
    #[must_use]
    pub fn parameter_types(&self) -> &ParameterTypes {
        &self.parameter_types
    }

    /// Find the first definition matching `text` for `role` in a scenario
    /// tagged with `tags`.
    ///
    /// Returns `None` when nothing matches. A match whose captures fail to
    /// convert yields `Some(Err(..))`.
    pub fn find<S: AsRef<str>>(
        &self,
        text: &str,
        role: StepRole,
        tags: &[S],
    ) -> Option<Result<StepMatch<'_, W>, PatternError>> {
        self.definitions
            .iter()
            .filter(|definition| definition.role.accepts(role))
            .filter(|definition| {
                definition
                    .tag_scope
                    .as_ref()
                    .is_none_or(|scope| scope.matches(tags.iter().map(AsRef::as_ref)))
            })
            .find_map(|definition| {
                definition.pattern.match_text(text).map(|result| {
                    result.map(|args| StepMatch { definition, args })
                })
            })
    }

    /// Up to `limit` registered patterns closest to `text`, best first.
    ///
    /// Distance is the Levenshtein distance between the lowercased text and
    /// the lowercased pattern rendering; ties keep registration order.
    #[must_use]
    pub fn suggest(&self, text: &str, limit: usize) -> Vec<Suggestion> {
        let needle = text.to_lowercase();
        let mut suggestions: Vec<_> = self
            .definitions
            .iter()
            .map(|definition| Suggestion {
                pattern: definition.pattern.rendering().to_string(),
                role: definition.role,
                distance: edit_distance(&needle, &definition.pattern.rendering().to_lowercase()),
            })
            .collect();
        suggestions.sort_by_key(|suggestion| suggestion.distance);
        suggestions.truncate(limit);
        suggestions
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition<W>> {
        self.definitions.iter()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Return `true` when no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Remove every definition and custom parameter type.
    pub fn clear(&mut self) {
        self.definitions.clear();
        self.parameter_types.clear_custom();
    }
}

impl<'r, W> IntoIterator for &'r StepRegistry<W> {
    type Item = &'r StepDefinition<W>;
    type IntoIter = std::slice::Iter<'r, StepDefinition<W>>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}

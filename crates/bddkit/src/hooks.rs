//! Lifecycle hooks.
//!
//! Hooks are registered for one [`HookScope`] with an optional tag filter and
//! run in ascending priority order, registration order breaking ties. Each
//! hook is raced against its own timeout by the runner.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bddkit_tags::{TagExprError, TagFilter};
use thiserror::Error;

use crate::HandlerFuture;
use crate::result::Status;

/// Priority assigned when none is given.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Timeout assigned when none is given.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle point a hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub enum HookScope {
    /// Once, before the first feature.
    BeforeAll,
    /// Once, after the last feature, even when earlier hooks failed.
    AfterAll,
    /// Before each feature.
    BeforeFeature,
    /// After each feature.
    AfterFeature,
    /// Before each scenario, after the world is created.
    BeforeScenario,
    /// After each scenario, with its status.
    AfterScenario,
    /// Before each step.
    BeforeStep,
    /// After each step, with its status.
    AfterStep,
}

impl HookScope {
    /// Every scope, in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::BeforeAll,
        Self::BeforeFeature,
        Self::BeforeScenario,
        Self::BeforeStep,
        Self::AfterStep,
        Self::AfterScenario,
        Self::AfterFeature,
        Self::AfterAll,
    ];

    /// Camel-case name, e.g. `beforeScenario`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeAll => "beforeAll",
            Self::AfterAll => "afterAll",
            Self::BeforeFeature => "beforeFeature",
            Self::AfterFeature => "afterFeature",
            Self::BeforeScenario => "beforeScenario",
            Self::AfterScenario => "afterScenario",
            Self::BeforeStep => "beforeStep",
            Self::AfterStep => "afterStep",
        }
    }

    /// Return `true` for the `before*` scopes.
    #[must_use]
    pub const fn is_before(self) -> bool {
        matches!(
            self,
            Self::BeforeAll | Self::BeforeFeature | Self::BeforeScenario | Self::BeforeStep
        )
    }
}

impl fmt::Display for HookScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while registering hooks.
#[derive(Debug, Error)]
pub enum HookError {
    /// The tag filter is not a valid tag expression.
    #[error("invalid hook filter `{filter}`: {source}")]
    InvalidFilter {
        /// Filter as written.
        filter: String,
        /// Parse failure.
        #[source]
        source: TagExprError,
    },
}

/// Optional settings for a hook.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use bddkit::HookOptions;
///
/// let options = HookOptions::default()
///     .named("seed database")
///     .with_priority(10)
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(options.priority, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOptions {
    /// Name shown in failures. Defaults to the scope and registration index.
    pub name: Option<String>,
    /// Lower runs earlier.
    pub priority: i32,
    /// Maximum time the hook may take.
    pub timeout: Duration,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            name: None,
            priority: DEFAULT_PRIORITY,
            timeout: DEFAULT_HOOK_TIMEOUT,
        }
    }
}

impl HookOptions {
    /// Set the name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Context passed to a hook handler.
///
/// Scenario and step hooks own the scenario's world for the duration of the
/// call; run and feature hooks see `None`.
#[derive(Debug)]
pub struct HookContext<W> {
    scope: HookScope,
    feature: Option<String>,
    scenario: Option<String>,
    step: Option<String>,
    tags: Vec<String>,
    status: Option<Status>,
    pub(crate) world: Option<W>,
}

impl<W> HookContext<W> {
    pub(crate) fn new(scope: HookScope) -> Self {
        Self {
            scope,
            feature: None,
            scenario: None,
            step: None,
            tags: Vec::new(),
            status: None,
            world: None,
        }
    }

    pub(crate) fn for_feature(mut self, name: &str, tags: &[String]) -> Self {
        self.feature = Some(name.to_string());
        self.tags = tags.to_vec();
        self
    }

    pub(crate) fn for_scenario(mut self, name: &str, tags: &[String]) -> Self {
        self.scenario = Some(name.to_string());
        self.tags = tags.to_vec();
        self
    }

    pub(crate) fn for_step(mut self, text: &str) -> Self {
        self.step = Some(text.to_string());
        self
    }

    pub(crate) fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_world(mut self, world: Option<W>) -> Self {
        self.world = world;
        self
    }

    /// Lifecycle point being run.
    #[must_use]
    pub fn scope(&self) -> HookScope {
        self.scope
    }

    /// Name of the current feature.
    #[must_use]
    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    /// Name of the current scenario.
    #[must_use]
    pub fn scenario(&self) -> Option<&str> {
        self.scenario.as_deref()
    }

    /// Text of the current step.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    /// Effective tags of the current feature or scenario.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Status of the finished scenario or step, for `after*` hooks.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// The scenario's world.
    #[must_use]
    pub fn world(&self) -> Option<&W> {
        self.world.as_ref()
    }

    /// The scenario's world, mutably.
    pub fn world_mut(&mut self) -> Option<&mut W> {
        self.world.as_mut()
    }
}

/// Handler stored for a hook.
pub type HookHandler<W> =
    Arc<dyn for<'a> Fn(&'a mut HookContext<W>) -> HandlerFuture<'a> + Send + Sync>;

/// A registered hook.
pub struct HookDefinition<W> {
    scope: HookScope,
    filter: Option<TagFilter>,
    name: String,
    priority: i32,
    timeout: Duration,
    handler: HookHandler<W>,
}

impl<W> HookDefinition<W> {
    /// Scope the hook runs at.
    #[must_use]
    pub fn scope(&self) -> HookScope {
        self.scope
    }

    /// Tag filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&TagFilter> {
        self.filter.as_ref()
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Priority; lower runs earlier.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Maximum run time.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &HookHandler<W> {
        &self.handler
    }

    fn applies_to<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.matches_non_empty(tags.iter().map(AsRef::as_ref)))
    }
}

impl<W> Clone for HookDefinition<W> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope,
            filter: self.filter.clone(),
            name: self.name.clone(),
            priority: self.priority,
            timeout: self.timeout,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<W> fmt::Debug for HookDefinition<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDefinition")
            .field("scope", &self.scope)
            .field("filter", &self.filter)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Hooks for worlds of type `W`.
pub struct HookRegistry<W> {
    hooks: Vec<HookDefinition<W>>,
}

impl<W> Default for HookRegistry<W> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<W> Clone for HookRegistry<W> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl<W> fmt::Debug for HookRegistry<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.hooks).finish()
    }
}

impl<W> HookRegistry<W> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unfiltered hook with default options.
    pub fn on<F>(&mut self, scope: HookScope, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut HookContext<W>) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.push(scope, None, HookOptions::default(), Arc::new(handler));
        self
    }

    /// Register a hook that only runs for tag sets satisfying `filter`.
    ///
    /// # Errors
    /// Returns [`HookError::InvalidFilter`] for a malformed filter.
    pub fn on_tagged<F>(
        &mut self,
        scope: HookScope,
        filter: &str,
        handler: F,
    ) -> Result<&mut Self, HookError>
    where
        F: for<'a> Fn(&'a mut HookContext<W>) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.register(scope, Some(filter), HookOptions::default(), handler)
    }

    /// Register a hook with an optional filter and explicit options.
    ///
    /// A blank filter counts as no filter.
    ///
    /// # Errors
    /// Returns [`HookError::InvalidFilter`] for a malformed filter.
    pub fn register<F>(
        &mut self,
        scope: HookScope,
        filter: Option<&str>,
        options: HookOptions,
        handler: F,
    ) -> Result<&mut Self, HookError>
    where
        F: for<'a> Fn(&'a mut HookContext<W>) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        let parsed = TagFilter::parse_optional(filter).map_err(|source| HookError::InvalidFilter {
            filter: filter.unwrap_or_default().to_string(),
            source,
        })?;
        self.push(scope, parsed, options, Arc::new(handler));
        Ok(self)
    }

    fn push(
        &mut self,
        scope: HookScope,
        filter: Option<TagFilter>,
        options: HookOptions,
        handler: HookHandler<W>,
    ) {
        let index = self.hooks.len();
        let name = options
            .name
            .unwrap_or_else(|| format!("{scope}#{index}"));
        self.hooks.push(HookDefinition {
            scope,
            filter,
            name,
            priority: options.priority,
            timeout: options.timeout,
            handler,
        });
    }

    /// Hooks for `scope` whose filter accepts `tags`, in execution order.
    ///
    /// A filtered hook never runs for an empty tag set.
    pub fn select<S: AsRef<str>>(&self, scope: HookScope, tags: &[S]) -> Vec<&HookDefinition<W>> {
        let mut selected: Vec<_> = self
            .hooks
            .iter()
            .filter(|hook| hook.scope == scope && hook.applies_to(tags))
            .collect();
        selected.sort_by_key(|hook| hook.priority);
        selected
    }

    /// Hooks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HookDefinition<W>> {
        self.hooks.iter()
    }

    /// Number of hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Return `true` when no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Remove every hook.
    pub fn clear(&mut self) {
        self.hooks.clear();
    }
}

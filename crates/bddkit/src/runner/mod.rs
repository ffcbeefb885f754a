//! Execution engine.
//!
//! [`Runner`] walks parsed documents in order: `beforeAll` hooks, then per
//! feature its `beforeFeature` hooks, its scenarios (rules included) and its
//! `afterFeature` hooks, then `afterAll` hooks. Execution is single-threaded
//! and cooperative; the only concurrency is the race between a handler and
//! its timeout.

mod invoke;
mod scenario;

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use bddkit_gherkin::{Document, Feature, FeatureChild, Rule, RuleChild, Scenario, Step, Tag};
use bddkit_tags::{TagExprError, TagFilter, merge_tag_sets};
use thiserror::Error;
use tracing::{Instrument, info, info_span};

use crate::config::RunConfig;
use crate::expand::{Instance, expand};
use crate::hooks::{HookContext, HookRegistry, HookScope};
use crate::registry::StepRegistry;
use crate::result::{Counts, FeatureResult, HookFailure, RunResult, ScenarioResult, Status, Summary};

/// Default number of suggestions recorded for an undefined step.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;

/// Errors raised while setting up or driving a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The tag filter is not a valid tag expression.
    #[error("invalid tag filter: {0}")]
    InvalidTags(#[from] TagExprError),
    /// The Tokio runtime for [`Runner::run_blocking`] could not be built.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Runs documents against a step registry and a hook registry.
///
/// A fresh world is created for every scenario instance through the world
/// factory.
pub struct Runner<W> {
    steps: StepRegistry<W>,
    hooks: HookRegistry<W>,
    world_factory: Box<dyn Fn() -> W>,
    filter: Option<TagFilter>,
    step_timeout: Duration,
    fail_fast: bool,
    keep_going: bool,
    suggestion_limit: usize,
}

impl<W> fmt::Debug for Runner<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("steps", &self.steps.len())
            .field("hooks", &self.hooks.len())
            .field("filter", &self.filter)
            .field("step_timeout", &self.step_timeout)
            .field("fail_fast", &self.fail_fast)
            .field("keep_going", &self.keep_going)
            .finish_non_exhaustive()
    }
}

impl<W: Default + 'static> Runner<W> {
    /// Create a runner whose worlds are built with [`Default`].
    #[must_use]
    pub fn new(steps: StepRegistry<W>, hooks: HookRegistry<W>) -> Self {
        Self::with_world_factory(steps, hooks, W::default)
    }
}

impl<W: 'static> Runner<W> {
    /// Create a runner with a custom world factory.
    pub fn with_world_factory<F>(steps: StepRegistry<W>, hooks: HookRegistry<W>, factory: F) -> Self
    where
        F: Fn() -> W + 'static,
    {
        let defaults = RunConfig::default();
        Self {
            steps,
            hooks,
            world_factory: Box::new(factory),
            filter: None,
            step_timeout: defaults.step_timeout,
            fail_fast: defaults.fail_fast,
            keep_going: defaults.keep_going,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    /// Only run scenarios whose effective tags satisfy `expression`. A blank
    /// expression runs everything.
    ///
    /// # Errors
    /// Returns [`RunnerError::InvalidTags`] for a malformed expression.
    pub fn with_tags(mut self, expression: &str) -> Result<Self, RunnerError> {
        self.filter = TagFilter::parse_optional(Some(expression))?;
        Ok(self)
    }

    /// Apply the tag filter, timeout and run modes from `config`.
    ///
    /// # Errors
    /// Returns [`RunnerError::InvalidTags`] for a malformed tag filter.
    pub fn with_config(mut self, config: &RunConfig) -> Result<Self, RunnerError> {
        self.filter = TagFilter::parse_optional(config.tags.as_deref())?;
        self.step_timeout = config.step_timeout;
        self.fail_fast = config.fail_fast;
        self.keep_going = config.keep_going;
        Ok(self)
    }

    /// Set the per-step timeout.
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Stop scheduling scenarios after the first failed one.
    #[must_use]
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Keep executing steps after a failed, undefined or pending one.
    #[must_use]
    pub fn keep_going(mut self, enabled: bool) -> Self {
        self.keep_going = enabled;
        self
    }

    /// Set how many suggestions an undefined step records.
    #[must_use]
    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// The step registry.
    #[must_use]
    pub fn steps(&self) -> &StepRegistry<W> {
        &self.steps
    }

    /// The hook registry.
    #[must_use]
    pub fn hooks(&self) -> &HookRegistry<W> {
        &self.hooks
    }

    /// Run `documents` in order and collect the result tree.
    ///
    /// Ordinary test failures are statuses in the result, never errors.
    /// Documents without a feature are ignored.
    pub async fn run(&self, documents: &[Document]) -> RunResult {
        let span = info_span!("run", documents = documents.len());
        self.run_documents(documents).instrument(span).await
    }

    /// Drive [`run`](Self::run) to completion on a current-thread Tokio
    /// runtime with a [`LocalSet`](tokio::task::LocalSet), so handlers may use
    /// `spawn_local`.
    ///
    /// # Errors
    /// Returns [`RunnerError::Runtime`] when the runtime cannot be built.
    pub fn run_blocking(&self, documents: &[Document]) -> Result<RunResult, RunnerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let local_set = tokio::task::LocalSet::new();
        Ok(local_set.block_on(&runtime, self.run(documents)))
    }

    async fn run_documents(&self, documents: &[Document]) -> RunResult {
        let started = Instant::now();
        let mut world = None;
        let mut result = RunResult::default();

        let setup = HookContext::new(HookScope::BeforeAll);
        result.hook_failures = self.fire_hooks(setup, &mut world, &[]).await;
        if result.hook_failures.is_empty() {
            for document in documents {
                let Some(feature) = &document.feature else {
                    continue;
                };
                let (feature_result, stop) =
                    self.run_feature(feature, document.source.as_deref()).await;
                result.features.push(feature_result);
                if stop {
                    info!("fail-fast: not scheduling further features");
                    break;
                }
            }
        }
        let teardown = HookContext::new(HookScope::AfterAll);
        let after = self.fire_hooks(teardown, &mut world, &[]).await;
        result.hook_failures.extend(after);

        result.summary = summarise_run(&result.features);
        result.status = if result.hook_failures.is_empty() {
            Status::aggregate(result.features.iter().map(|feature| feature.status))
        } else {
            Status::Failed
        };
        result.duration = started.elapsed();
        info!(
            status = %result.status,
            scenarios = result.summary.scenarios.total,
            failed = result.summary.scenarios.failed,
            "run finished"
        );
        result
    }

    /// Run one feature. The flag is `true` when fail-fast should stop the run.
    async fn run_feature(&self, feature: &Feature, source: Option<&str>) -> (FeatureResult, bool) {
        let span = info_span!("feature", name = %feature.name, line = feature.line);
        async move {
            let started = Instant::now();
            let tags = merge_tag_sets::<&str>(&[], &tag_names(&feature.tags));
            let plan = self.plan_feature(feature, &tags);
            let mut scenarios = Vec::with_capacity(plan.len());
            let mut hook_failures = Vec::new();
            let mut stop = false;

            if plan.iter().any(|planned| planned.instance.included) {
                let mut world = None;
                let setup = HookContext::new(HookScope::BeforeFeature).for_feature(&feature.name, &tags);
                hook_failures = self.fire_hooks(setup, &mut world, &tags).await;
                if hook_failures.is_empty() {
                    for planned in &plan {
                        let result = self.run_planned(feature, planned).await;
                        let failed = result.status == Status::Failed;
                        scenarios.push(result);
                        if failed && self.fail_fast {
                            stop = true;
                            break;
                        }
                    }
                }
                let teardown =
                    HookContext::new(HookScope::AfterFeature).for_feature(&feature.name, &tags);
                let after = self.fire_hooks(teardown, &mut world, &tags).await;
                hook_failures.extend(after);
            } else {
                scenarios.extend(plan.iter().map(skipped_result));
            }

            let summary = Summary {
                features: Counts::default(),
                scenarios: Counts::from(scenarios.iter().map(|scenario| scenario.status)),
                steps: scenarios.iter().fold(Counts::default(), |mut counts, scenario| {
                    counts.merge(&scenario.step_counts());
                    counts
                }),
            };
            let status = if hook_failures.is_empty() {
                Status::aggregate(scenarios.iter().map(|scenario| scenario.status))
            } else {
                Status::Failed
            };
            let result = FeatureResult {
                name: feature.name.clone(),
                source: source.map(str::to_string),
                line: feature.line,
                tags,
                status,
                duration: started.elapsed(),
                scenarios,
                summary,
                hook_failures,
            };
            (result, stop)
        }
        .instrument(span)
        .await
    }

    /// Expand every scenario of `feature` in source order.
    fn plan_feature<'d>(&self, feature: &'d Feature, feature_tags: &[String]) -> Vec<Planned<'d>> {
        let feature_background = background_steps(feature.background().map(|bg| bg.steps.as_slice()));
        let mut plan = Vec::new();
        for child in &feature.children {
            match child {
                FeatureChild::Background(_) => {}
                FeatureChild::Scenario(scenario) => {
                    self.plan_scenario(&mut plan, scenario, None, &feature_background, feature_tags);
                }
                FeatureChild::Rule(rule) => {
                    let rule_tags = merge_tag_sets(feature_tags, &tag_names(&rule.tags));
                    let mut background = feature_background.clone();
                    background.extend(background_steps(rule.background().map(|bg| bg.steps.as_slice())));
                    for rule_child in &rule.children {
                        if let RuleChild::Scenario(scenario) = rule_child {
                            self.plan_scenario(&mut plan, scenario, Some(rule), &background, &rule_tags);
                        }
                    }
                }
            }
        }
        plan
    }

    fn plan_scenario<'d>(
        &self,
        plan: &mut Vec<Planned<'d>>,
        scenario: &'d Scenario,
        rule: Option<&'d Rule>,
        background: &[&'d Step],
        inherited: &[String],
    ) {
        plan.extend(
            expand(scenario, inherited, self.filter.as_ref())
                .into_iter()
                .map(|instance| Planned {
                    scenario,
                    rule,
                    background: background.to_vec(),
                    instance,
                }),
        );
    }

    /// Run the hooks selected for the context's scope, lending them `world`.
    ///
    /// `before*` scopes stop at the first failure; `after*` scopes run every
    /// hook.
    async fn fire_hooks(
        &self,
        mut ctx: HookContext<W>,
        world: &mut Option<W>,
        tags: &[String],
    ) -> Vec<HookFailure> {
        let scope = ctx.scope();
        let hooks = self.hooks.select(scope, tags);
        if hooks.is_empty() {
            return Vec::new();
        }
        ctx.world = world.take();
        let mut failures = Vec::new();
        for hook in hooks {
            let outcome = invoke::invoke_hook(hook.handler(), &mut ctx, hook.timeout()).await;
            if let Some(error) = outcome.into_hook_error() {
                failures.push(HookFailure {
                    scope,
                    name: hook.name().to_string(),
                    error,
                });
                if scope.is_before() {
                    break;
                }
            }
        }
        *world = ctx.world.take();
        failures
    }
}

/// A scenario instance with the context needed to run it.
#[derive(Debug)]
struct Planned<'d> {
    scenario: &'d Scenario,
    rule: Option<&'d Rule>,
    background: Vec<&'d Step>,
    instance: Instance,
}

fn tag_names(tags: &[Tag]) -> Vec<&str> {
    tags.iter().map(|tag| tag.name.as_str()).collect()
}

fn background_steps(steps: Option<&[Step]>) -> Vec<&Step> {
    steps.map(|steps| steps.iter().collect()).unwrap_or_default()
}

/// Result for an instance that is not executed.
fn skipped_result(planned: &Planned<'_>) -> ScenarioResult {
    ScenarioResult {
        name: planned.instance.name.clone(),
        keyword: planned.scenario.keyword.clone(),
        line: planned.scenario.line,
        rule: planned.rule.map(|rule| rule.name.clone()),
        tags: planned.instance.tags.clone(),
        example: planned.instance.example.clone(),
        status: Status::Skipped,
        duration: Duration::ZERO,
        steps: Vec::new(),
        hook_failures: Vec::new(),
    }
}

fn summarise_run(features: &[FeatureResult]) -> Summary {
    let mut summary = Summary {
        features: Counts::from(features.iter().map(|feature| feature.status)),
        ..Summary::default()
    };
    for feature in features {
        summary.scenarios.merge(&feature.summary.scenarios);
        summary.steps.merge(&feature.summary.steps);
    }
    summary
}

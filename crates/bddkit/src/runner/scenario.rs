//! Scenario and step execution.

use std::time::{Duration, Instant};

use bddkit_gherkin::{Feature, Step};
use bddkit_patterns::{KeywordRole, StepRole, resolve_roles};
use tracing::{Instrument, debug, info_span, warn};

use super::invoke::invoke_step;
use super::{Planned, Runner, skipped_result};
use crate::context::StepContext;
use crate::hooks::{HookContext, HookScope};
use crate::result::{ErrorInfo, ErrorKind, ScenarioResult, Status, StepResult};

/// Names shared by the hook contexts of one scenario.
struct ScenarioNames<'a> {
    feature: &'a str,
    scenario: &'a str,
    tags: &'a [String],
}

impl ScenarioNames<'_> {
    fn hook_context<W>(&self, scope: HookScope) -> HookContext<W> {
        HookContext::new(scope)
            .for_feature(self.feature, &[])
            .for_scenario(self.scenario, self.tags)
    }
}

fn skipped_step(step: &Step, role: StepRole) -> StepResult {
    StepResult {
        keyword: step.keyword.clone(),
        text: step.text.clone(),
        role,
        line: step.line,
        status: Status::Skipped,
        duration: Duration::ZERO,
        error: None,
        suggestions: Vec::new(),
        attachments: Vec::new(),
        logs: Vec::new(),
        hook_failures: Vec::new(),
    }
}

impl<W: 'static> Runner<W> {
    /// Run one planned instance, or record it as skipped when the tag filter
    /// rejected it.
    pub(super) async fn run_planned(&self, feature: &Feature, planned: &Planned<'_>) -> ScenarioResult {
        if !planned.instance.included {
            return skipped_result(planned);
        }
        let span = info_span!(
            "scenario",
            name = %planned.instance.name,
            line = planned.scenario.line
        );
        self.run_instance(feature, planned).instrument(span).await
    }

    async fn run_instance(&self, feature: &Feature, planned: &Planned<'_>) -> ScenarioResult {
        let started = Instant::now();
        let instance = &planned.instance;
        let names = ScenarioNames {
            feature: &feature.name,
            scenario: &instance.name,
            tags: &instance.tags,
        };
        let steps: Vec<&Step> = planned
            .background
            .iter()
            .copied()
            .chain(instance.steps.iter())
            .collect();
        let (roles, _) = resolve_roles(steps.iter().map(|step| step.role), KeywordRole::Context);

        let mut world = Some((self.world_factory)());
        let mut hook_failures = self
            .fire_hooks(names.hook_context(HookScope::BeforeScenario), &mut world, names.tags)
            .await;
        let mut blocked = !hook_failures.is_empty() && !self.keep_going;

        let mut results = Vec::with_capacity(steps.len());
        for (step, role) in steps.into_iter().zip(roles) {
            if blocked {
                results.push(skipped_step(step, role));
                continue;
            }
            let result = self.run_step(&names, &mut world, step, role).await;
            if matches!(
                result.status,
                Status::Failed | Status::Undefined | Status::Pending
            ) && !self.keep_going
            {
                blocked = true;
            }
            results.push(result);
        }

        let mut status = if hook_failures.is_empty() {
            Status::aggregate(results.iter().map(|step| step.status))
        } else {
            Status::Failed
        };
        let teardown = names
            .hook_context(HookScope::AfterScenario)
            .with_status(status);
        let after = self.fire_hooks(teardown, &mut world, names.tags).await;
        if !after.is_empty() {
            status = Status::Failed;
        }
        hook_failures.extend(after);

        ScenarioResult {
            name: instance.name.clone(),
            keyword: planned.scenario.keyword.clone(),
            line: planned.scenario.line,
            rule: planned.rule.map(|rule| rule.name.clone()),
            tags: instance.tags.clone(),
            example: instance.example.clone(),
            status,
            duration: started.elapsed(),
            steps: results,
            hook_failures,
        }
    }

    async fn run_step(
        &self,
        names: &ScenarioNames<'_>,
        world: &mut Option<W>,
        step: &Step,
        role: StepRole,
    ) -> StepResult {
        debug!(keyword = %step.keyword, text = %step.text, %role, "running step");
        let started = Instant::now();
        let mut result = skipped_step(step, role);

        let before = self
            .fire_hooks(
                names.hook_context(HookScope::BeforeStep).for_step(&step.text),
                world,
                names.tags,
            )
            .await;
        if let Some(failure) = before.first() {
            result.status = Status::Failed;
            result.error = Some(ErrorInfo::new(ErrorKind::Hook, failure.to_string()));
        } else {
            self.match_and_invoke(&mut result, world, step, role, names.tags)
                .await;
        }
        result.duration = started.elapsed();
        result.hook_failures = before;

        let teardown = names
            .hook_context(HookScope::AfterStep)
            .for_step(&step.text)
            .with_status(result.status);
        let after = self.fire_hooks(teardown, world, names.tags).await;
        for failure in &after {
            warn!(step = %step.text, %failure, "afterStep hook failed; continuing");
        }
        result.hook_failures.extend(after);
        result
    }

    async fn match_and_invoke(
        &self,
        result: &mut StepResult,
        world: &mut Option<W>,
        step: &Step,
        role: StepRole,
        tags: &[String],
    ) {
        let found = match self.steps.find(&step.text, role, tags) {
            None => {
                result.status = Status::Undefined;
                result.error = Some(ErrorInfo::new(
                    ErrorKind::Undefined,
                    format!("no step definition matches `{} {}`", step.keyword, step.text),
                ));
                result.suggestions = self
                    .steps
                    .suggest(&step.text, self.suggestion_limit)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                return;
            }
            Some(Err(err)) => {
                result.status = Status::Failed;
                result.error = Some(ErrorInfo::new(ErrorKind::Error, err.to_string()));
                return;
            }
            Some(Ok(found)) => found,
        };

        let labels = found.labels();
        let mut ctx = StepContext::new(step.text.clone())
            .with_args(found.args)
            .with_labels(labels)
            .with_role(role)
            .with_table(step.table.clone())
            .with_doc_string(step.doc_string.clone());
        let world = world.get_or_insert_with(|| (self.world_factory)());
        let outcome = invoke_step(found.definition.handler(), world, &mut ctx, self.step_timeout).await;
        let (status, error) = outcome.into_step_status();
        let (attachments, logs) = ctx.into_outputs();
        result.status = status;
        result.error = error;
        result.attachments = attachments;
        result.logs = logs;
    }
}

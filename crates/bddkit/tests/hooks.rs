//! Lifecycle hooks around runs, features, scenarios and steps.

use std::time::Duration;

use bddkit::{
    ErrorKind, HookContext, HookOptions, HookRegistry, HookScope, Runner, Status, StepError,
    StepRegistry,
};

mod common;
use common::{Journal, World, inline, load_feature, noop, run, scenario, step};

fn step_registry() -> StepRegistry<World> {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a step", |world, _| {
            Box::pin(async move {
                world.log.push("step".into());
                Ok(())
            })
        })
        .and_then(|steps| steps.then("another step", noop))
        .unwrap_or_else(|err| panic!("steps should register: {err}"));
    steps
}

/// Register a hook that records `label` and the scenario name, if any.
fn record(hooks: &mut HookRegistry<World>, scope: HookScope, journal: &Journal, label: &str) {
    let journal = journal.clone();
    let label = label.to_string();
    hooks.on(scope, move |ctx: &mut HookContext<World>| {
        let entry = ctx
            .scenario()
            .map_or_else(|| label.clone(), |name| format!("{label}:{name}"));
        journal.push(entry);
        Box::pin(async { Ok(()) })
    });
}

#[test]
fn tagged_before_hooks_only_run_for_matching_scenarios() {
    let journal = Journal::default();
    let mut hooks = HookRegistry::<World>::new();
    let seen = journal.clone();
    hooks
        .on_tagged(HookScope::BeforeScenario, "@smoke", move |ctx| {
            seen.push(ctx.scenario().unwrap_or_default().to_string());
            Box::pin(async { Ok(()) })
        })
        .unwrap_or_else(|err| panic!("filter should parse: {err}"));
    let runner = Runner::new(step_registry(), hooks);
    let result = run(&runner, &[load_feature("tagged.feature")]);

    assert_eq!(result.summary.scenarios.passed, 2);
    assert_eq!(journal.entries(), ["smoke and cart"]);
}

#[test]
fn hooks_fire_in_lifecycle_order() {
    let journal = Journal::default();
    let mut hooks = HookRegistry::<World>::new();
    for (scope, label) in [
        (HookScope::AfterAll, "afterAll"),
        (HookScope::AfterFeature, "afterFeature"),
        (HookScope::AfterScenario, "afterScenario"),
        (HookScope::AfterStep, "afterStep"),
        (HookScope::BeforeStep, "beforeStep"),
        (HookScope::BeforeScenario, "beforeScenario"),
        (HookScope::BeforeFeature, "beforeFeature"),
        (HookScope::BeforeAll, "beforeAll"),
    ] {
        record(&mut hooks, scope, &journal, label);
    }
    let runner = Runner::new(step_registry(), hooks);
    let document = inline("Feature: Order\n  Scenario: one\n    Given a step\n");
    let result = run(&runner, &[document]);

    assert_eq!(result.status, Status::Passed);
    assert_eq!(
        journal.entries(),
        [
            "beforeAll",
            "beforeFeature",
            "beforeScenario:one",
            "beforeStep:one",
            "afterStep:one",
            "afterScenario:one",
            "afterFeature",
            "afterAll",
        ]
    );
}

#[test]
fn lower_priorities_run_first() {
    let journal = Journal::default();
    let mut hooks = HookRegistry::<World>::new();
    for (name, priority) in [("late", 2000), ("early", 10), ("default", 1000)] {
        let journal = journal.clone();
        hooks
            .register(
                HookScope::BeforeScenario,
                None,
                HookOptions::default().named(name).with_priority(priority),
                move |_| {
                    journal.push(name);
                    Box::pin(async { Ok(()) })
                },
            )
            .unwrap_or_else(|err| panic!("hook should register: {err}"));
    }
    let runner = Runner::new(step_registry(), hooks);
    run(
        &runner,
        &[inline("Feature: Order\n  Scenario: one\n    Given a step\n")],
    );
    assert_eq!(journal.entries(), ["early", "default", "late"]);
}

#[test]
fn scenario_hooks_share_the_world_with_steps() {
    let mut hooks = HookRegistry::<World>::new();
    hooks.on(HookScope::BeforeScenario, |ctx| {
        if let Some(world) = ctx.world_mut() {
            world.log.push("before".into());
        }
        Box::pin(async { Ok(()) })
    });
    hooks.on(HookScope::AfterScenario, |ctx| {
        let log = ctx.world().map(|world| world.log.join(",")).unwrap_or_default();
        Box::pin(async move {
            if log == "before,step" {
                Ok(())
            } else {
                Err(StepError::failed(format!("unexpected log {log}")))
            }
        })
    });
    let runner = Runner::new(step_registry(), hooks);
    let result = run(
        &runner,
        &[inline("Feature: World\n  Scenario: shared\n    Given a step\n")],
    );
    assert_eq!(result.status, Status::Passed);
}

#[test]
fn failing_before_scenario_hooks_skip_the_steps() {
    let mut hooks = HookRegistry::<World>::new();
    hooks
        .register(
            HookScope::BeforeScenario,
            None,
            HookOptions::default().named("database"),
            |_| Box::pin(async { Err(StepError::failed("connection refused")) }),
        )
        .unwrap_or_else(|err| panic!("hook should register: {err}"));
    let runner = Runner::new(step_registry(), hooks);
    let result = run(
        &runner,
        &[inline("Feature: Hooks\n  Scenario: guarded\n    Given a step\n    Then another step\n")],
    );

    let guarded = scenario(&result, 0);
    assert_eq!(guarded.status, Status::Failed);
    assert!(guarded.steps.iter().all(|step| step.status == Status::Skipped));
    let Some(failure) = guarded.hook_failures.first() else {
        panic!("the hook failure should be recorded");
    };
    assert_eq!(failure.scope, HookScope::BeforeScenario);
    assert_eq!(failure.name, "database");
    assert_eq!(failure.error.message, "connection refused");
}

#[test]
fn after_scenario_hooks_see_the_status_and_can_fail_it() {
    let journal = Journal::default();
    let mut hooks = HookRegistry::<World>::new();
    let seen = journal.clone();
    hooks.on(HookScope::AfterScenario, move |ctx| {
        seen.push(ctx.status().map(|status| status.label()).unwrap_or("none"));
        Box::pin(async { Err(StepError::failed("cleanup failed")) })
    });
    let runner = Runner::new(step_registry(), hooks);
    let result = run(
        &runner,
        &[inline("Feature: Hooks\n  Scenario: cleanup\n    Given a step\n")],
    );

    assert_eq!(journal.entries(), ["passed"]);
    let cleanup = scenario(&result, 0);
    assert_eq!(step(cleanup, 0).status, Status::Passed);
    assert_eq!(cleanup.status, Status::Failed);
}

#[test]
fn failing_before_step_hooks_fail_the_step() {
    let mut hooks = HookRegistry::<World>::new();
    hooks.on(HookScope::BeforeStep, |_| {
        Box::pin(async { Err(StepError::failed("not ready")) })
    });
    let runner = Runner::new(step_registry(), hooks);
    let result = run(
        &runner,
        &[inline("Feature: Hooks\n  Scenario: steps\n    Given a step\n    Then another step\n")],
    );

    let steps = scenario(&result, 0);
    let first = step(steps, 0);
    assert_eq!(first.status, Status::Failed);
    assert_eq!(first.error.as_ref().map(|error| error.kind), Some(ErrorKind::Hook));
    assert_eq!(step(steps, 1).status, Status::Skipped);
}

#[test]
fn failing_after_step_hooks_are_recorded_without_changing_the_step() {
    let mut hooks = HookRegistry::<World>::new();
    hooks.on(HookScope::AfterStep, |_| {
        Box::pin(async { Err(StepError::failed("screenshot failed")) })
    });
    let runner = Runner::new(step_registry(), hooks);
    let result = run(
        &runner,
        &[inline("Feature: Hooks\n  Scenario: steps\n    Given a step\n")],
    );

    let first = step(scenario(&result, 0), 0);
    assert_eq!(first.status, Status::Passed);
    assert_eq!(first.hook_failures.len(), 1);
}

#[test]
fn failing_before_all_hooks_skip_every_feature() {
    let journal = Journal::default();
    let mut hooks = HookRegistry::<World>::new();
    hooks.on(HookScope::BeforeAll, |_| {
        Box::pin(async { Err(StepError::failed("no environment")) })
    });
    record(&mut hooks, HookScope::AfterAll, &journal, "afterAll");
    let runner = Runner::new(step_registry(), hooks);
    let result = run(&runner, &[load_feature("tagged.feature")]);

    assert!(result.features.is_empty());
    assert_eq!(result.status, Status::Failed);
    assert_eq!(result.hook_failures.len(), 1);
    assert_eq!(journal.entries(), ["afterAll"]);
    assert!(!result.is_success());
}

#[test]
fn slow_hooks_time_out() {
    let mut hooks = HookRegistry::<World>::new();
    hooks
        .register(
            HookScope::BeforeScenario,
            None,
            HookOptions::default().with_timeout(Duration::from_millis(20)),
            |_| {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
            },
        )
        .unwrap_or_else(|err| panic!("hook should register: {err}"));
    let runner = Runner::new(step_registry(), hooks);
    let result = run(
        &runner,
        &[inline("Feature: Hooks\n  Scenario: slow\n    Given a step\n")],
    );

    let Some(failure) = scenario(&result, 0).hook_failures.first() else {
        panic!("the timeout should be recorded");
    };
    assert_eq!(failure.error.kind, ErrorKind::Timeout);
    assert_eq!(failure.name, "beforeScenario#0");
}

#[test]
fn feature_hooks_are_not_fired_when_every_scenario_is_filtered_out() {
    let journal = Journal::default();
    let mut hooks = HookRegistry::<World>::new();
    record(&mut hooks, HookScope::BeforeFeature, &journal, "beforeFeature");
    let runner = Runner::new(step_registry(), hooks)
        .with_tags("@nightly")
        .unwrap_or_else(|err| panic!("filter should parse: {err}"));
    let result = run(&runner, &[load_feature("tagged.feature")]);

    assert!(journal.entries().is_empty());
    assert_eq!(result.summary.scenarios.skipped, 2);
}

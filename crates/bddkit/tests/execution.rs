//! End-to-end execution of parsed features.

use std::time::Duration;

use bddkit::{
    ErrorKind, HookRegistry, Runner, RunnerError, Status, StepError, StepRegistry, StepRole,
};
use rstest::{fixture, rstest};

mod common;
use common::{World, inline, load_feature, noop, run, scenario, step};

fn shop_steps() -> StepRegistry<World> {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("I am on {string}", |world, ctx| {
            Box::pin(async move {
                world.log.push(ctx.arg_str(0)?.to_string());
                Ok(())
            })
        })
        .and_then(|steps| {
            steps.when("I sign in as {string}", |world, ctx| {
                Box::pin(async move {
                    world.log.push(format!("user {}", ctx.arg_str(0)?));
                    Ok(())
                })
            })
        })
        .and_then(|steps| steps.then("I see the dashboard", noop))
        .unwrap_or_else(|err| panic!("shop steps should register: {err}"));
    steps
}

fn basket_steps() -> StepRegistry<World> {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a basket with {int} items", |world, ctx| {
            Box::pin(async move {
                world.count = ctx.arg_int(0)?;
                Ok(())
            })
        })
        .and_then(|steps| {
            steps.when("I remove {int} items", |world, ctx| {
                Box::pin(async move {
                    world.count -= ctx.arg_int(0)?;
                    Ok(())
                })
            })
        })
        .and_then(|steps| {
            steps.then("the basket holds {int} items", |world, ctx| {
                Box::pin(async move {
                    let expected = ctx.arg_int(0)?;
                    if world.count == expected {
                        Ok(())
                    } else {
                        Err(StepError::failed(format!(
                            "expected {expected} items, found {}",
                            world.count
                        )))
                    }
                })
            })
        })
        .unwrap_or_else(|err| panic!("basket steps should register: {err}"));
    steps
}

fn clock_steps() -> StepRegistry<World> {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a stopped clock", |world, _| {
            Box::pin(async move {
                world.count = 0;
                Ok(())
            })
        })
        .and_then(|steps| {
            steps.given("the clock is reset", |world, _| {
                Box::pin(async move {
                    world.count = 0;
                    Ok(())
                })
            })
        })
        .and_then(|steps| {
            steps.when("the clock ticks", |world, _| {
                Box::pin(async move {
                    world.count += 1;
                    Ok(())
                })
            })
        })
        .and_then(|steps| {
            steps.then("the clock shows {int} ticks", |world, ctx| {
                Box::pin(async move {
                    let expected = ctx.arg_int(0)?;
                    if world.count == expected {
                        Ok(())
                    } else {
                        Err(StepError::failed(format!("clock shows {}", world.count)))
                    }
                })
            })
        })
        .unwrap_or_else(|err| panic!("clock steps should register: {err}"));
    steps
}

#[fixture]
fn three_steps() -> StepRegistry<World> {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a first step", noop)
        .and_then(|steps| {
            steps.when("a failing step", |_, _| {
                Box::pin(async { Err(StepError::failed("broken on purpose")) })
            })
        })
        .and_then(|steps| {
            steps.when("a pending step", |_, _| Box::pin(async { Err(StepError::pending()) }))
        })
        .and_then(|steps| steps.then("a last step", noop))
        .unwrap_or_else(|err| panic!("steps should register: {err}"));
    steps
}

#[test]
fn login_feature_passes_every_step() {
    let runner = Runner::new(shop_steps(), HookRegistry::new());
    let result = run(&runner, &[load_feature("login.feature")]);

    assert_eq!(result.summary.scenarios.total, 1);
    assert_eq!(result.summary.scenarios.passed, 1);
    assert_eq!(result.summary.steps.total, 3);
    assert_eq!(result.summary.steps.passed, 3);
    assert_eq!(result.status, Status::Passed);
    assert!(result.is_success());

    let Some(feature) = result.features.first() else {
        panic!("login feature should be reported");
    };
    assert_eq!(feature.source.as_deref(), Some("tests/features/login.feature"));
    assert_eq!(feature.tags, ["@auth"]);
    assert_eq!(scenario(&result, 0).tags, ["@auth"]);
}

#[tokio::test]
async fn run_can_be_awaited_directly() {
    let runner = Runner::new(shop_steps(), HookRegistry::new());
    let result = runner.run(&[load_feature("login.feature")]).await;
    assert_eq!(result.summary.steps.passed, 3);
}

#[test]
fn outline_rows_run_as_separate_scenarios() {
    let runner = Runner::new(basket_steps(), HookRegistry::new());
    let result = run(&runner, &[load_feature("outline.feature")]);

    assert_eq!(result.summary.scenarios.total, 2);
    assert_eq!(result.summary.scenarios.passed, 2);
    for (index, (start, left)) in [("12", "7"), ("20", "15")].into_iter().enumerate() {
        let row = scenario(&result, index);
        let Some(example) = &row.example else {
            panic!("outline row {index} should carry its example");
        };
        assert_eq!(example.block, 0);
        assert_eq!(example.row, index);
        assert_eq!(example.value("start"), Some(start));
        assert_eq!(step(row, 0).text, format!("a basket with {start} items"));
        assert_eq!(step(row, 2).text, format!("the basket holds {left} items"));
    }
}

#[test]
fn conjunctions_take_the_previous_role_across_the_background() {
    let runner = Runner::new(clock_steps(), HookRegistry::new());
    let result = run(&runner, &[load_feature("background.feature")]);

    let ticking = scenario(&result, 0);
    assert_eq!(ticking.status, Status::Passed);
    assert_eq!(ticking.steps.len(), 4);
    let carried = step(ticking, 2);
    assert_eq!(carried.keyword.trim(), "And");
    assert_eq!(carried.role, StepRole::When);
    assert_eq!(carried.status, Status::Passed);
}

#[test]
fn rule_scenarios_get_both_backgrounds() {
    let runner = Runner::new(clock_steps(), HookRegistry::new());
    let result = run(&runner, &[load_feature("background.feature")]);

    let reset = scenario(&result, 1);
    assert_eq!(reset.rule.as_deref(), Some("Resetting"));
    let texts: Vec<&str> = reset.steps.iter().map(|step| step.text.as_str()).collect();
    assert_eq!(
        texts,
        [
            "a stopped clock",
            "the clock ticks",
            "the clock is reset",
            "the clock ticks",
            "the clock shows 1 ticks",
        ]
    );
    assert_eq!(reset.status, Status::Passed);
}

#[test]
fn unmatched_steps_are_undefined_with_suggestions() {
    let steps = shop_steps();
    let expected: Vec<String> = steps
        .suggest("I am on the home page", 3)
        .iter()
        .map(ToString::to_string)
        .collect();
    let runner = Runner::new(steps, HookRegistry::new());
    let document = inline(
        "Feature: Browse\n  Scenario: home\n    Given I am on the home page\n    Then I see the dashboard\n",
    );
    let result = run(&runner, &[document]);

    let home = scenario(&result, 0);
    assert_eq!(home.status, Status::Pending);
    let undefined = step(home, 0);
    assert_eq!(undefined.status, Status::Undefined);
    assert_eq!(
        undefined.error.as_ref().map(|error| error.kind),
        Some(ErrorKind::Undefined)
    );
    assert_eq!(undefined.suggestions, expected);
    assert_eq!(
        undefined.suggestions.first().map(String::as_str),
        Some("Given I am on {string}")
    );
    assert_eq!(step(home, 1).status, Status::Skipped);
    assert_eq!(result.summary.steps.undefined, 1);
    assert!(!result.is_success());
}

#[test]
fn suggestions_are_ordered_by_distance() {
    let suggestions = shop_steps().suggest("I sign in as alice", 3);
    assert!(!suggestions.is_empty());
    assert!(suggestions.is_sorted_by_key(|suggestion| suggestion.distance));
}

#[rstest]
#[case::failure("a failing step", Status::Failed, ErrorKind::Error, "broken on purpose")]
#[case::pending("a pending step", Status::Pending, ErrorKind::Pending, "PENDING")]
fn a_stopping_step_skips_the_rest(
    three_steps: StepRegistry<World>,
    #[case] middle: &str,
    #[case] status: Status,
    #[case] kind: ErrorKind,
    #[case] message: &str,
) {
    let runner = Runner::new(three_steps, HookRegistry::new());
    let document = inline(&format!(
        "Feature: Stops\n  Scenario: stop\n    Given a first step\n    When {middle}\n    Then a last step\n"
    ));
    let result = run(&runner, &[document]);

    let stopped = scenario(&result, 0);
    assert_eq!(stopped.status, status);
    assert_eq!(step(stopped, 0).status, Status::Passed);
    let Some(error) = &step(stopped, 1).error else {
        panic!("the stopping step should record an error");
    };
    assert_eq!(error.kind, kind);
    assert_eq!(error.message, message);
    assert_eq!(step(stopped, 2).status, Status::Skipped);
}

#[rstest]
fn keep_going_runs_steps_after_a_failure(three_steps: StepRegistry<World>) {
    let runner = Runner::new(three_steps, HookRegistry::new()).keep_going(true);
    let document = inline(
        "Feature: Stops\n  Scenario: stop\n    Given a first step\n    When a failing step\n    Then a last step\n",
    );
    let result = run(&runner, &[document]);

    let kept = scenario(&result, 0);
    assert_eq!(kept.status, Status::Failed);
    assert_eq!(step(kept, 2).status, Status::Passed);
}

#[rstest]
fn fail_fast_stops_scheduling_after_a_failed_scenario(three_steps: StepRegistry<World>) {
    let runner = Runner::new(three_steps, HookRegistry::new()).fail_fast(true);
    let first = inline(
        "Feature: First\n  Scenario: fails\n    When a failing step\n  Scenario: never runs\n    Given a first step\n",
    );
    let second = inline("Feature: Second\n  Scenario: also never runs\n    Given a first step\n");
    let result = run(&runner, &[first, second]);

    assert_eq!(result.features.len(), 1);
    assert_eq!(result.summary.scenarios.total, 1);
    assert_eq!(result.status, Status::Failed);
}

#[test]
fn panicking_handlers_fail_the_step() {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a step that panics", |_: &mut World, _| {
            Box::pin(futures::future::lazy(|_| -> Result<(), StepError> {
                panic!("handler blew up")
            }))
        })
        .unwrap_or_else(|err| panic!("step should register: {err}"));
    let runner = Runner::new(steps, HookRegistry::new());
    let result = run(
        &runner,
        &[inline("Feature: Panics\n  Scenario: boom\n    Given a step that panics\n")],
    );

    let Some(error) = &step(scenario(&result, 0), 0).error else {
        panic!("the panic should be recorded");
    };
    assert_eq!(error.kind, ErrorKind::Panic);
    assert_eq!(error.message, "handler blew up");
}

#[test]
fn slow_handlers_time_out() {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a slow step", |_: &mut World, _| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
        })
        .unwrap_or_else(|err| panic!("step should register: {err}"));
    let runner =
        Runner::new(steps, HookRegistry::new()).with_step_timeout(Duration::from_millis(20));
    let result = run(
        &runner,
        &[inline("Feature: Slow\n  Scenario: wait\n    Given a slow step\n")],
    );

    let slow = step(scenario(&result, 0), 0);
    assert_eq!(slow.status, Status::Failed);
    let Some(error) = &slow.error else {
        panic!("the timeout should be recorded");
    };
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(error.message, "timed out after 20 ms");
}

#[test]
fn handlers_see_tables_doc_strings_and_side_channels() {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("these users:", |world: &mut World, ctx| {
            Box::pin(async move {
                let rows = ctx.require_table()?.rows.len();
                world.log.push(format!("{rows} rows"));
                ctx.log(format!("read {rows} rows"));
                Ok(())
            })
        })
        .and_then(|steps| {
            steps.then("the payload is", |_, ctx| {
                Box::pin(async move {
                    let body = ctx.require_doc_string()?.to_string();
                    ctx.attach(body, "application/json");
                    Ok(())
                })
            })
        })
        .unwrap_or_else(|err| panic!("steps should register: {err}"));
    let runner = Runner::new(steps, HookRegistry::new());
    let document = inline(concat!(
        "Feature: Arguments\n",
        "  Scenario: both\n",
        "    Given these users:\n",
        "      | name  |\n",
        "      | alice |\n",
        "      | bob   |\n",
        "    Then the payload is\n",
        "      \"\"\"\n",
        "      {\"ok\": true}\n",
        "      \"\"\"\n",
    ));
    let result = run(&runner, &[document]);

    let both = scenario(&result, 0);
    assert_eq!(both.status, Status::Passed);
    assert_eq!(step(both, 0).logs, ["read 3 rows"]);
    let Some(attachment) = step(both, 1).attachments.first() else {
        panic!("the doc string should be attached");
    };
    assert_eq!(attachment.data, "{\"ok\": true}");
    assert_eq!(attachment.media_type, "application/json");
}

#[test]
fn every_scenario_gets_a_fresh_world() {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a step", |world: &mut World, _| {
            Box::pin(async move {
                world.count += 1;
                if world.count == 1 {
                    Ok(())
                } else {
                    Err(StepError::failed("world was reused"))
                }
            })
        })
        .unwrap_or_else(|err| panic!("step should register: {err}"));
    let runner = Runner::new(steps, HookRegistry::new());
    let result = run(&runner, &[load_feature("tagged.feature")]);
    assert_eq!(result.summary.scenarios.passed, 2);
}

#[test]
fn custom_world_factories_seed_each_scenario() {
    let mut steps = StepRegistry::<World>::new();
    steps
        .then("the basket holds {int} items", |world: &mut World, ctx| {
            Box::pin(async move {
                if world.count == ctx.arg_int(0)? {
                    Ok(())
                } else {
                    Err(StepError::failed("unexpected count"))
                }
            })
        })
        .unwrap_or_else(|err| panic!("step should register: {err}"));
    let runner = Runner::with_world_factory(steps, HookRegistry::new(), || World {
        count: 10,
        ..World::default()
    });
    let result = run(
        &runner,
        &[inline("Feature: Seeded\n  Scenario: ten\n    Then the basket holds 10 items\n")],
    );
    assert_eq!(result.status, Status::Passed);
}

#[test]
fn tag_filters_record_rejected_scenarios_as_skipped() {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a step", noop)
        .unwrap_or_else(|err| panic!("step should register: {err}"));
    let runner = Runner::new(steps, HookRegistry::new())
        .with_tags("@smoke")
        .unwrap_or_else(|err| panic!("filter should parse: {err}"));
    let result = run(&runner, &[load_feature("tagged.feature")]);

    let cart_only = scenario(&result, 0);
    assert_eq!(cart_only.status, Status::Skipped);
    assert!(cart_only.steps.is_empty());
    assert_eq!(scenario(&result, 1).status, Status::Passed);
    assert_eq!(result.summary.scenarios.skipped, 1);
}

#[test]
fn malformed_tag_filters_are_rejected() {
    let result = Runner::new(shop_steps(), HookRegistry::new()).with_tags("@smoke and");
    assert!(matches!(result, Err(RunnerError::InvalidTags(_))));
}

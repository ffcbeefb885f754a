//! Report writers over real runs.

use bddkit::reporting::{junit, summary};
use bddkit::{HookRegistry, RunResult, Runner, StepError, StepRegistry};

mod common;
use common::{World, inline, load_feature, noop, run};

fn mixed_run() -> RunResult {
    let mut steps = StepRegistry::<World>::new();
    steps
        .given("a step", noop)
        .and_then(|steps| {
            steps.then("it breaks with {string}", |_, ctx| {
                Box::pin(async move { Err(StepError::failed(ctx.arg_str(0)?)) })
            })
        })
        .unwrap_or_else(|err| panic!("steps should register: {err}"));
    let runner = Runner::new(steps, HookRegistry::new());
    let broken = inline(
        "Feature: Broken\n  Scenario: fails\n    Given a step\n    Then it breaks with \"a < b\"\n  Scenario: undefined\n    Given nobody wrote this\n",
    );
    run(&runner, &[load_feature("tagged.feature"), broken])
}

#[test]
fn summary_counts_every_outcome() {
    assert_eq!(
        summary(&mixed_run()),
        "4 scenarios (1 failed, 1 pending, 2 passed)\n5 steps (1 failed, 1 undefined, 3 passed)"
    );
}

#[test]
fn junit_report_has_a_suite_per_feature() {
    let output = junit::to_string(&mixed_run()).unwrap_or_else(|err| panic!("junit renders: {err}"));

    assert!(output.contains("<testsuites name=\"bddkit\" tests=\"4\" failures=\"1\" skipped=\"1\""));
    assert!(output.contains("  <testsuite name=\"Tagged hooks\" tests=\"2\" failures=\"0\" skipped=\"0\""));
    assert!(output.contains("  <testsuite name=\"Broken\" tests=\"2\" failures=\"1\" skipped=\"1\""));
    assert!(output.contains("classname=\"tests/features/tagged.feature\""));
    assert!(output.contains("<failure type=\"error\" message=\"a &lt; b\">a &lt; b</failure>"));
    assert!(output.contains("<skipped message=\"no step definition matches `Given nobody wrote this`\" />"));
}

#[cfg(feature = "json")]
#[test]
fn json_report_mirrors_the_result_tree() {
    use bddkit::reporting::json;

    let result = mixed_run();
    let mut buffer = Vec::new();
    json::write(&mut buffer, &result).unwrap_or_else(|err| panic!("json renders: {err}"));
    let value: serde_json::Value =
        serde_json::from_slice(&buffer).unwrap_or_else(|err| panic!("json parses: {err}"));

    assert_eq!(value["status"], "failed");
    assert_eq!(value["summary"]["steps"]["undefined"], 1);
    let broken = &value["features"][1];
    assert_eq!(broken["name"], "Broken");
    assert_eq!(broken["scenarios"][0]["steps"][1]["error"]["message"], "a < b");
    assert_eq!(broken["scenarios"][1]["status"], "pending");
    assert_eq!(
        broken["scenarios"][1]["steps"][0]["suggestions"][0],
        "Given a step"
    );
}

//! Shared helpers for the engine integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use bddkit::{
    Document, FeatureParser, HandlerFuture, RunResult, Runner, ScenarioResult, StepContext, StepResult,
    parse_strict,
};

/// World used by most integration tests.
#[derive(Debug, Default)]
pub struct World {
    /// Free-form trace written by steps.
    pub log: Vec<String>,
    /// Counter manipulated by arithmetic steps.
    pub count: i64,
}

/// Load and strictly parse a fixture from `tests/features`.
pub fn load_feature(name: &str) -> Document {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features")
        .join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("fixture {} should be readable: {err}", path.display()));
    FeatureParser::new()
        .with_source(format!("tests/features/{name}"))
        .parse_strict(&text)
        .unwrap_or_else(|err| panic!("fixture {name} should parse: {err}"))
}

/// Strictly parse inline feature text.
pub fn inline(text: &str) -> Document {
    parse_strict(text).unwrap_or_else(|err| panic!("inline feature should parse: {err}"))
}

/// Step handler that does nothing.
pub fn noop<'a>(_: &'a mut World, _: &'a mut StepContext) -> HandlerFuture<'a> {
    Box::pin(async { Ok(()) })
}

/// Run `documents` to completion on a fresh runtime.
pub fn run(runner: &Runner<World>, documents: &[Document]) -> RunResult {
    runner
        .run_blocking(documents)
        .unwrap_or_else(|err| panic!("run should start: {err}"))
}

/// The `index`th scenario result of a run, across features.
pub fn scenario(result: &RunResult, index: usize) -> &ScenarioResult {
    result
        .scenarios()
        .nth(index)
        .unwrap_or_else(|| panic!("run should have scenario {index}"))
}

/// The `index`th step result of a scenario, background steps included.
pub fn step(scenario: &ScenarioResult, index: usize) -> &StepResult {
    scenario
        .steps
        .get(index)
        .unwrap_or_else(|| panic!("{} should have step {index}", scenario.name))
}

/// Thread-safe list of events shared between handlers and the test body.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// Append an event.
    pub fn push(&self, event: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    /// Snapshot of every event so far.
    pub fn entries(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

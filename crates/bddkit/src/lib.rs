//! Behaviour-driven scenario engine.
//!
//! `bddkit` runs parsed feature documents against step definitions held in a
//! [`StepRegistry`], firing lifecycle hooks from a [`HookRegistry`] and
//! collecting everything into a [`RunResult`] tree.
//!
//! ```
//! use bddkit::{HookRegistry, Runner, StepRegistry, parse_strict};
//!
//! #[derive(Default)]
//! struct World {
//!     visited: Vec<String>,
//! }
//!
//! let mut steps = StepRegistry::<World>::new();
//! steps
//!     .given("I am on {string}", |world, ctx| {
//!         Box::pin(async move {
//!             world.visited.push(ctx.arg_str(0)?.to_string());
//!             Ok(())
//!         })
//!     })
//!     .expect("pattern registers");
//!
//! let document = parse_strict(
//!     "Feature: Browse\n  Scenario: home\n    Given I am on \"https://x.test\"\n",
//! )
//! .expect("feature parses");
//! let runner = Runner::new(steps, HookRegistry::new());
//! let result = runner.run_blocking(&[document]).expect("runtime builds");
//! assert_eq!(result.summary.steps.passed, 1);
//! ```
//!
//! The parser, tag language and pattern compiler live in sibling crates and
//! are re-exported here.

pub mod config;
mod context;
pub mod expand;
pub mod global;
pub mod hooks;
pub mod logging;
mod panic;
pub mod registry;
pub mod reporting;
pub mod result;
pub mod runner;

pub use bddkit_gherkin::{
    DataTable, Diagnostic, DiagnosticKind, Document, FeatureParser, ParseError, Parsed, parse,
    parse_strict, render_document,
};
pub use bddkit_patterns::{
    KeywordRole, ParameterType, PatternError, Registration, StepArg, StepRole, resolve_roles,
};
pub use bddkit_tags::{TagExprError, TagExpression, TagFilter};
pub use config::{ConfigError, LogLevel, RunConfig};
pub use context::{Attachment, StepContext, StepError};
pub use hooks::{HookContext, HookError, HookOptions, HookRegistry, HookScope};
pub use panic::panic_message;
pub use registry::{RegistryError, StepDefinition, StepMatch, StepRegistry, Suggestion};
pub use result::{
    Counts, ErrorInfo, ErrorKind, ExampleRef, FeatureResult, HookFailure, RunResult,
    ScenarioResult, Status, StepResult, Summary,
};
pub use runner::{Runner, RunnerError};

/// Future returned by step and hook handlers.
pub type HandlerFuture<'a> = futures::future::LocalBoxFuture<'a, Result<(), StepError>>;

//! Structured logging for runs.
//!
//! The engine emits `tracing` spans for the run, each feature and each
//! scenario, plus events for steps and recoverable problems such as
//! parameter types that shadow a builtin. Embedders with their own
//! subscriber receive these directly; [`init_logging`] installs a stderr
//! formatter for everyone else so stdout stays free for reports.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::{LogLevel, RunConfig};

/// Targets whose verbosity follows [`RunConfig::log_level`].
const ENGINE_TARGETS: [&str; 4] = ["bddkit", "bddkit_gherkin", "bddkit_patterns", "bddkit_tags"];

/// Everything outside the engine, step code included, logs at `warn`.
fn directives(level: LogLevel) -> String {
    ENGINE_TARGETS
        .iter()
        .fold(String::from("warn"), |mut acc, target| {
            acc.push(',');
            acc.push_str(target);
            acc.push('=');
            acc.push_str(level.as_filter_str());
            acc
        })
}

/// Install a stderr subscriber for the configured level.
///
/// Returns `false` when another global subscriber was installed first, in
/// which case that subscriber stays in charge.
pub fn init_logging(config: &RunConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives(config.log_level)))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .without_time()
        .try_init()
        .is_ok()
}

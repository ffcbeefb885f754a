//! Run configuration parsed from environment variables.
//!
//! Every setting has a default and may be overridden through a `BDDKIT_`
//! prefixed environment variable. Callers with their own command line can
//! layer [`RunOverrides`] on top.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use bddkit_gherkin::FeatureParser;
use thiserror::Error;

/// Default per-step timeout in milliseconds.
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;

/// Dialect used for documents without a `# language:` directive.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The log level is not one of the known names.
    #[error("unknown log level '{0}', expected one of: trace, debug, info, warn, error")]
    LogLevel(String),
    /// A variable expected a number of milliseconds.
    #[error("invalid value '{value}' for {key}, expected milliseconds")]
    Milliseconds {
        /// Variable name.
        key: &'static str,
        /// Value found.
        value: String,
    },
    /// A variable expected a boolean.
    #[error("invalid value '{value}' for {key}, expected true or false")]
    Boolean {
        /// Variable name.
        key: &'static str,
        /// Value found.
        value: String,
    },
}

/// Log level enumeration matching tracing levels.
///
/// Defaults to `Warn`, so parser diagnostics and swallowed hook failures
/// show up without any setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every span and event.
    Trace,
    /// Per-step events.
    Debug,
    /// Run, feature and scenario spans.
    Info,
    /// Recoverable problems.
    #[default]
    Warn,
    /// Failures only.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::LogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

pub(crate) fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "Yes" | "on" | "ON" | "On" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off" => {
            Some(false)
        }
        _ => None,
    }
}

/// Settings for a run.
///
/// # Environment Variables
///
/// - `BDDKIT_TAGS`: tag expression selecting scenarios
/// - `BDDKIT_STEP_TIMEOUT_MS`: per-step timeout
/// - `BDDKIT_FAIL_FAST`: stop scheduling scenarios after the first failure
/// - `BDDKIT_KEEP_GOING`: keep running steps after a failed or undefined one
/// - `BDDKIT_LOG_LEVEL`: trace, debug, info, warn or error
/// - `BDDKIT_LANGUAGE`: default dialect code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Tag expression; `None` runs everything.
    pub tags: Option<String>,
    /// Maximum run time of a step handler.
    pub step_timeout: Duration,
    /// Stop scheduling after the first failed scenario.
    pub fail_fast: bool,
    /// Keep executing steps after a failure.
    pub keep_going: bool,
    /// Log level for [`init_logging`](crate::logging::init_logging).
    pub log_level: LogLevel,
    /// Dialect for documents without a language directive.
    pub language: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tags: None,
            step_timeout: Duration::from_millis(DEFAULT_STEP_TIMEOUT_MS),
            fail_fast: false,
            keep_going: false,
            log_level: LogLevel::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Overrides taking precedence over environment-derived settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    /// Replacement tag expression.
    pub tags: Option<String>,
    /// Replacement step timeout.
    pub step_timeout: Option<Duration>,
    /// Replacement fail-fast flag.
    pub fail_fast: Option<bool>,
    /// Replacement keep-going flag.
    pub keep_going: Option<bool>,
    /// Replacement log level.
    pub log_level: Option<LogLevel>,
    /// Replacement default dialect.
    pub language: Option<String>,
}

impl RunConfig {
    /// Load configuration from `BDDKIT_*` environment variables.
    ///
    /// Missing or empty variables keep their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let step_timeout = match read("BDDKIT_STEP_TIMEOUT_MS") {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Milliseconds {
                    key: "BDDKIT_STEP_TIMEOUT_MS",
                    value,
                })?,
            None => defaults.step_timeout,
        };
        let flag = |key: &'static str, default: bool| {
            read(key).map_or(Ok(default), |value| {
                parse_env_bool(&value).ok_or(ConfigError::Boolean { key, value })
            })
        };
        let log_level = match read("BDDKIT_LOG_LEVEL") {
            Some(value) => value.parse()?,
            None => defaults.log_level,
        };

        Ok(Self {
            tags: read("BDDKIT_TAGS").map(|tags| tags.trim().to_string()),
            step_timeout,
            fail_fast: flag("BDDKIT_FAIL_FAST", defaults.fail_fast)?,
            keep_going: flag("BDDKIT_KEEP_GOING", defaults.keep_going)?,
            log_level,
            language: read("BDDKIT_LANGUAGE")
                .map_or(defaults.language, |language| language.trim().to_string()),
        })
    }

    /// Apply overrides to an existing configuration.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: RunOverrides) -> Self {
        if let Some(tags) = overrides.tags {
            self.tags = Some(tags).filter(|tags| !tags.trim().is_empty());
        }
        if let Some(timeout) = overrides.step_timeout {
            self.step_timeout = timeout;
        }
        if let Some(fail_fast) = overrides.fail_fast {
            self.fail_fast = fail_fast;
        }
        if let Some(keep_going) = overrides.keep_going {
            self.keep_going = keep_going;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(language) = overrides.language {
            self.language = language;
        }
        self
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Create a new configuration with the specified tag expression.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// A feature parser using the configured default dialect.
    #[must_use]
    pub fn parser(&self) -> FeatureParser {
        FeatureParser::new().with_default_language(self.language.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("Debug", LogLevel::Debug)]
    #[case("INFO", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn log_level_parses_case_insensitively(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let result = "loud".parse::<LogLevel>();
        assert!(
            result
                .as_ref()
                .is_err_and(|err| err.to_string().contains("unknown log level")),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn parse_env_bool_understands_common_values() {
        for truthy in [
            "1", "true", "TRUE", "True", "yes", "YES", "Yes", "on", "ON", "On",
        ] {
            assert_eq!(
                parse_env_bool(truthy),
                Some(true),
                "expected {truthy} to be truthy"
            );
        }
        for falsy in [
            "0", "false", "FALSE", "False", "no", "NO", "No", "off", "OFF", "Off",
        ] {
            assert_eq!(
                parse_env_bool(falsy),
                Some(false),
                "expected {falsy} to be falsy"
            );
        }
        assert_eq!(parse_env_bool("maybe"), None);
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = RunConfig::from_lookup(|_| None)
            .unwrap_or_else(|err| panic!("empty environment should load: {err}"));
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.step_timeout, Duration::from_secs(30));
        assert_eq!(config.language, "en");
    }

    #[test]
    fn variables_override_defaults() {
        let config = RunConfig::from_lookup(lookup_from(&[
            ("BDDKIT_TAGS", " @smoke and not @slow "),
            ("BDDKIT_STEP_TIMEOUT_MS", "250"),
            ("BDDKIT_FAIL_FAST", "yes"),
            ("BDDKIT_KEEP_GOING", "Off"),
            ("BDDKIT_LOG_LEVEL", "debug"),
            ("BDDKIT_LANGUAGE", "fr"),
        ]))
        .unwrap_or_else(|err| panic!("environment should load: {err}"));
        assert_eq!(config.tags.as_deref(), Some("@smoke and not @slow"));
        assert_eq!(config.step_timeout, Duration::from_millis(250));
        assert!(config.fail_fast);
        assert!(!config.keep_going);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.language, "fr");
    }

    #[rstest]
    #[case("BDDKIT_STEP_TIMEOUT_MS", "soon")]
    #[case("BDDKIT_FAIL_FAST", "sometimes")]
    #[case("BDDKIT_LOG_LEVEL", "chatty")]
    fn invalid_values_are_rejected(#[case] key: &str, #[case] value: &str) {
        let result = RunConfig::from_lookup(lookup_from(&[(key, value)]));
        assert!(result.is_err(), "{key}={value} should be rejected");
    }

    #[test]
    fn blank_tags_mean_no_filter() {
        let config = RunConfig::from_lookup(lookup_from(&[("BDDKIT_TAGS", "   ")]))
            .unwrap_or_else(|err| panic!("environment should load: {err}"));
        assert!(config.tags.is_none());
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let config = RunConfig::default().apply_overrides(RunOverrides {
            step_timeout: Some(Duration::from_millis(5)),
            keep_going: Some(true),
            log_level: Some(LogLevel::Error),
            ..RunOverrides::default()
        });
        assert_eq!(config.step_timeout, Duration::from_millis(5));
        assert!(config.keep_going);
        assert!(!config.fail_fast);
        assert_eq!(config.log_level, LogLevel::Error);

        let unchanged = RunConfig::default().apply_overrides(RunOverrides::default());
        assert_eq!(unchanged, RunConfig::default());
    }

    #[test]
    fn parser_uses_configured_language() {
        let config = RunConfig::default().apply_overrides(RunOverrides {
            language: Some("fr".into()),
            ..RunOverrides::default()
        });
        let parsed = config
            .parser()
            .parse("Fonctionnalité: Panier\n  Scénario: vide\n    Soit un panier\n")
            .unwrap_or_else(|err| panic!("french feature should parse: {err}"));
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.document.language, "fr");
    }
}

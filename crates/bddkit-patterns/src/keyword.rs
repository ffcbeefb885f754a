//! Step keyword roles and conjunction resolution.
//!
//! Parsed steps carry a [`KeywordRole`] describing what the written keyword
//! means in its dialect. Step definitions are registered against a
//! [`StepRole`]. Conjunctions (`And`, `But`) and the bullet `*` inherit the
//! role of the step before them, which [`resolve_roles`] computes as a fold.

use std::fmt;
use std::str::FromStr;

/// Language-independent classification of a written step keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordRole {
    /// Preconditions (`Given`).
    Context,
    /// Actions (`When`).
    Action,
    /// Expected outcomes (`Then`).
    Outcome,
    /// `And` or `But`.
    Conjunction,
    /// The `*` bullet.
    Unknown,
}

impl KeywordRole {
    /// Return `true` for roles that inherit from the previous step.
    #[must_use]
    pub const fn is_inherited(self) -> bool {
        matches!(self, Self::Conjunction | Self::Unknown)
    }

    /// Fold step: resolve `self` against the accumulator `prev`.
    ///
    /// Primary roles replace the accumulator and are returned unchanged;
    /// inherited roles return the accumulator and leave it untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use bddkit_patterns::KeywordRole;
    ///
    /// let (acc, role) = KeywordRole::Conjunction.resolve(KeywordRole::Action);
    /// assert_eq!((acc, role), (KeywordRole::Action, KeywordRole::Action));
    /// let (acc, role) = KeywordRole::Outcome.resolve(acc);
    /// assert_eq!((acc, role), (KeywordRole::Outcome, KeywordRole::Outcome));
    /// ```
    #[must_use]
    pub const fn resolve(self, prev: Self) -> (Self, Self) {
        if self.is_inherited() {
            (prev, prev)
        } else {
            (self, self)
        }
    }
}

/// Role a step definition is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepRole {
    /// Matches only `Given`-like steps.
    Given,
    /// Matches only `When`-like steps.
    When,
    /// Matches only `Then`-like steps.
    Then,
    /// Matches steps of every role.
    Any,
}

impl StepRole {
    /// Return the role as a string slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use bddkit_patterns::StepRole;
    ///
    /// assert_eq!(StepRole::Given.as_str(), "Given");
    /// assert_eq!(StepRole::Any.as_str(), "Any");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::Any => "Any",
        }
    }

    /// Return `true` when a definition registered under `self` may serve a
    /// step resolved to `requested`.
    #[must_use]
    pub fn accepts(self, requested: Self) -> bool {
        self == Self::Any || requested == Self::Any || self == requested
    }
}

impl fmt::Display for StepRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<KeywordRole> for StepRole {
    fn from(role: KeywordRole) -> Self {
        match role {
            KeywordRole::Context => Self::Given,
            KeywordRole::Action => Self::When,
            KeywordRole::Outcome => Self::Then,
            KeywordRole::Conjunction | KeywordRole::Unknown => Self::Any,
        }
    }
}

/// Error returned when parsing a [`StepRole`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRoleParseError(pub String);

impl fmt::Display for StepRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step role: {}", self.0)
    }
}

impl std::error::Error for StepRoleParseError {}

impl FromStr for StepRole {
    type Err = StepRoleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("given") {
            Ok(Self::Given)
        } else if trimmed.eq_ignore_ascii_case("when") {
            Ok(Self::When)
        } else if trimmed.eq_ignore_ascii_case("then") {
            Ok(Self::Then)
        } else if trimmed.eq_ignore_ascii_case("any") || trimmed == "*" {
            Ok(Self::Any)
        } else {
            Err(StepRoleParseError(trimmed.to_string()))
        }
    }
}

/// Resolve a sequence of keyword roles into step roles.
///
/// The accumulator starts at `seed` and is carried across the whole input,
/// so callers concatenating background and scenario steps get inheritance
/// across the boundary. Returns the resolved roles together with the final
/// accumulator.
///
/// # Examples
///
/// ```
/// use bddkit_patterns::{resolve_roles, KeywordRole, StepRole};
///
/// let (roles, last) = resolve_roles(
///     [KeywordRole::Context, KeywordRole::Action, KeywordRole::Conjunction],
///     KeywordRole::Context,
/// );
/// assert_eq!(roles, vec![StepRole::Given, StepRole::When, StepRole::When]);
/// assert_eq!(last, KeywordRole::Action);
/// ```
pub fn resolve_roles<I>(roles: I, seed: KeywordRole) -> (Vec<StepRole>, KeywordRole)
where
    I: IntoIterator<Item = KeywordRole>,
{
    roles
        .into_iter()
        .fold((Vec::new(), seed), |(mut resolved, acc), role| {
            let (next, effective) = role.resolve(acc);
            resolved.push(StepRole::from(effective));
            (resolved, next)
        })
}

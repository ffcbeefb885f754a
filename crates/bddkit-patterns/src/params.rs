//! Parameter types used to compile `{name}` placeholders.
//!
//! Every parameter type pairs a regular-expression fragment with a transform
//! converting the captured text into a [`StepArg`]. The built-in types are
//! `string`, `int`, `float`, `word` and `any`. Custom types can be registered
//! at any time; lookups consult the built-ins first, so a custom type sharing
//! a built-in name never takes effect.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::errors::PatternError;

/// Conversion applied to the text captured for a parameter.
pub type TransformFn = Arc<dyn Fn(&str) -> Result<StepArg, String> + Send + Sync>;

/// Typed argument extracted from a matched step.
///
/// # Examples
/// ```
/// use bddkit_patterns::StepArg;
///
/// let arg = StepArg::Int(3);
/// assert_eq!(arg.as_int(), Some(3));
/// assert_eq!(arg.as_str(), None);
/// ```
#[derive(Clone)]
pub enum StepArg {
    /// Textual capture (`string`, `word`, `any` and raw regex groups).
    Text(String),
    /// Signed integer capture (`int`).
    Int(i64),
    /// Decimal capture (`float`).
    Float(f64),
    /// Value produced by a custom parameter type.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl StepArg {
    /// Wrap an arbitrary value produced by a custom transform.
    #[must_use]
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Borrow the text of a [`StepArg::Text`] argument.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Return the value of a [`StepArg::Int`] argument.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Return the value of a [`StepArg::Float`] or [`StepArg::Int`] argument.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "integers are widened for callers that accept either numeric form"
    )]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Downcast a [`StepArg::Custom`] argument.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for StepArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for StepArg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for StepArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Custom(_) => f.write_str("<custom>"),
        }
    }
}

/// A named regex fragment plus the transform applied to its capture.
#[derive(Clone)]
pub struct ParameterType {
    name: String,
    fragment: String,
    groups: usize,
    transform: TransformFn,
}

impl ParameterType {
    /// Create a custom parameter type.
    ///
    /// The fragment is wrapped in a capture group; any groups inside it are
    /// counted so later parameters keep their positions.
    ///
    /// # Errors
    /// Returns [`PatternError::Regex`] when the fragment is not a valid
    /// regular expression.
    ///
    /// # Examples
    /// ```
    /// use bddkit_patterns::{ParameterType, StepArg};
    ///
    /// let colour = ParameterType::new("colour", "red|green|blue", |text| {
    ///     Ok(StepArg::Text(text.to_uppercase()))
    /// })
    /// .expect("fragment compiles");
    /// assert_eq!(colour.name(), "colour");
    /// assert_eq!(colour.fragment(), "(red|green|blue)");
    /// ```
    pub fn new<F>(
        name: impl Into<String>,
        fragment: &str,
        transform: F,
    ) -> Result<Self, PatternError>
    where
        F: Fn(&str) -> Result<StepArg, String> + Send + Sync + 'static,
    {
        let fragment = format!("({fragment})");
        let groups = Regex::new(&fragment)?.captures_len().saturating_sub(1);
        Ok(Self {
            name: name.into(),
            fragment,
            groups,
            transform: Arc::new(transform),
        })
    }

    fn builtin(name: &str, fragment: &str, transform: TransformFn) -> Self {
        Self {
            name: name.to_string(),
            fragment: fragment.to_string(),
            groups: 1,
            transform,
        }
    }

    /// Name used inside placeholders, e.g. `int` for `{int}`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Regex fragment substituted for the placeholder. The first capture
    /// group of the fragment holds the value.
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Number of capture groups the fragment contributes.
    #[must_use]
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Apply the transform to a captured value.
    ///
    /// # Errors
    /// Returns the transform's reason when the text cannot be converted.
    pub fn transform(&self, text: &str) -> Result<StepArg, String> {
        (self.transform)(text)
    }
}

impl fmt::Debug for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterType")
            .field("name", &self.name)
            .field("fragment", &self.fragment)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// Outcome of registering a custom parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The name was not known before.
    Added,
    /// A custom type with the same name was replaced.
    Replaced,
    /// The name belongs to a built-in type, which keeps precedence.
    ShadowsBuiltin,
}

fn text_transform() -> TransformFn {
    Arc::new(|text: &str| Ok(StepArg::Text(text.to_string())))
}

fn int_transform() -> TransformFn {
    Arc::new(|text: &str| {
        text.parse::<i64>()
            .map(StepArg::Int)
            .map_err(|err| err.to_string())
    })
}

fn float_transform() -> TransformFn {
    Arc::new(|text: &str| {
        text.parse::<f64>()
            .map(StepArg::Float)
            .map_err(|err| err.to_string())
    })
}

/// Fragment used for placeholders naming an unknown parameter type.
pub(crate) const FALLBACK_FRAGMENT: &str = "(.*)";

/// Lookup table of parameter types available to the pattern compiler.
///
/// # Examples
/// ```
/// use bddkit_patterns::ParameterTypes;
///
/// let types = ParameterTypes::default();
/// assert!(types.get("int").is_some());
/// assert!(types.get("colour").is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ParameterTypes {
    builtins: Vec<ParameterType>,
    custom: Vec<ParameterType>,
}

impl Default for ParameterTypes {
    fn default() -> Self {
        let builtins = vec![
            ParameterType::builtin("string", r#""([^"]*)""#, text_transform()),
            ParameterType::builtin("int", r"([-+]?\d+)", int_transform()),
            ParameterType::builtin(
                "float",
                r"([-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?)",
                float_transform(),
            ),
            ParameterType::builtin("word", r"(\S+)", text_transform()),
            ParameterType::builtin("any", FALLBACK_FRAGMENT, text_transform()),
        ];
        Self {
            builtins,
            custom: Vec::new(),
        }
    }
}

impl ParameterTypes {
    /// Create a table holding only the built-in types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom parameter type.
    ///
    /// A custom type whose name matches a built-in is stored but never
    /// consulted; the returned [`Registration::ShadowsBuiltin`] lets callers
    /// flag the mistake.
    pub fn register(&mut self, parameter: ParameterType) -> Registration {
        if self.is_builtin(parameter.name()) {
            self.custom.push(parameter);
            return Registration::ShadowsBuiltin;
        }
        if let Some(existing) = self
            .custom
            .iter_mut()
            .find(|existing| existing.name() == parameter.name())
        {
            *existing = parameter;
            return Registration::Replaced;
        }
        self.custom.push(parameter);
        Registration::Added
    }

    /// Return `true` when `name` belongs to a built-in type.
    #[must_use]
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|builtin| builtin.name() == name)
    }

    /// Look up a parameter type, consulting built-ins before custom types.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterType> {
        self.builtins
            .iter()
            .chain(self.custom.iter())
            .find(|parameter| parameter.name() == name)
    }

    /// Type used for placeholders whose name is not registered.
    pub(crate) fn fallback(name: &str) -> ParameterType {
        ParameterType::builtin(name, FALLBACK_FRAGMENT, text_transform())
    }

    /// Drop every custom type, keeping the built-ins.
    pub fn clear_custom(&mut self) {
        self.custom.clear();
    }
}

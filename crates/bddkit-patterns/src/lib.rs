//! Step-pattern compilation utilities for bddkit.
//!
//! The crate turns `{name}` placeholder patterns into anchored regular
//! expressions, converts captures through named parameter types, and
//! classifies step keywords into roles. The runtime registry builds on these
//! pieces; they carry no knowledge of handlers or worlds.

mod distance;
mod errors;
mod keyword;
mod params;
mod pattern;

pub use distance::edit_distance;
pub use errors::{PatternError, SyntaxFault};
pub use keyword::{KeywordRole, StepRole, StepRoleParseError, resolve_roles};
pub use params::{ParameterType, ParameterTypes, Registration, StepArg, TransformFn};
pub use pattern::{
    PatternParameter, PatternSource, StepPattern, build_regex_from_pattern,
    compile_regex_from_pattern,
};

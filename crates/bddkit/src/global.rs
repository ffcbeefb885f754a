//! Process-wide default registries.
//!
//! Step and hook registries are normally explicit values handed to a
//! [`Runner`]. Binaries that register definitions from many places can use
//! the defaults kept here instead: one pair of registries per world type,
//! shared by the whole process. Tests that touch them should run serially
//! and call [`clear`] first.
//!
//! ```
//! use bddkit::global;
//!
//! #[derive(Default)]
//! struct Counter(u32);
//!
//! global::with_steps::<Counter, _>(|steps| {
//!     steps
//!         .given("a counter", |_, _| Box::pin(async { Ok(()) }))
//!         .map(|_| ())
//! })
//! .expect("pattern registers");
//! let runner = global::runner::<Counter>();
//! assert_eq!(runner.steps().len(), 1);
//! # global::clear();
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use crate::hooks::HookRegistry;
use crate::registry::StepRegistry;
use crate::runner::Runner;

type DefaultsMap = HashMap<TypeId, Box<dyn Any + Send>>;

static DEFAULTS: LazyLock<Mutex<DefaultsMap>> = LazyLock::new(|| Mutex::new(HashMap::new()));

struct Defaults<W> {
    steps: StepRegistry<W>,
    hooks: HookRegistry<W>,
}

impl<W> Default for Defaults<W> {
    fn default() -> Self {
        Self {
            steps: StepRegistry::new(),
            hooks: HookRegistry::new(),
        }
    }
}

fn lock_defaults() -> MutexGuard<'static, DefaultsMap> {
    DEFAULTS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_defaults<W: 'static, R>(f: impl FnOnce(&mut Defaults<W>) -> R) -> R {
    let key = TypeId::of::<W>();
    let mut map = lock_defaults();
    // The slot is taken out while `f` runs; a panic in `f` leaves it empty.
    let mut defaults: Box<Defaults<W>> = map
        .remove(&key)
        .and_then(|slot| slot.downcast().ok())
        .unwrap_or_default();
    let outcome = f(&mut defaults);
    map.insert(key, defaults);
    outcome
}

/// Run `f` against the default step registry for world type `W`.
///
/// The registry lock is held while `f` runs, so `f` must not call back into
/// this module.
pub fn with_steps<W: 'static, R>(f: impl FnOnce(&mut StepRegistry<W>) -> R) -> R {
    with_defaults(|defaults: &mut Defaults<W>| f(&mut defaults.steps))
}

/// Run `f` against the default hook registry for world type `W`.
///
/// The same locking rule as [`with_steps`] applies.
pub fn with_hooks<W: 'static, R>(f: impl FnOnce(&mut HookRegistry<W>) -> R) -> R {
    with_defaults(|defaults: &mut Defaults<W>| f(&mut defaults.hooks))
}

/// Build a runner over snapshots of the default registries for `W`.
///
/// Definitions registered afterwards are not seen by the returned runner.
#[must_use]
pub fn runner<W: Default + 'static>() -> Runner<W> {
    let (steps, hooks) = with_defaults(|defaults: &mut Defaults<W>| {
        (defaults.steps.clone(), defaults.hooks.clone())
    });
    Runner::new(steps, hooks)
}

/// Drop every default registry, for every world type.
pub fn clear() {
    lock_defaults().clear();
}

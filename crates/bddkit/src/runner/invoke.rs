//! Guarded handler invocation.
//!
//! Handlers are called under `catch_unwind` and raced against a timeout. A
//! timed-out future is dropped at its current suspension point; work it
//! spawned elsewhere may still complete.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use futures::FutureExt;

use crate::HandlerFuture;
use crate::context::{StepContext, StepError};
use crate::hooks::{HookContext, HookHandler};
use crate::panic::panic_message;
use crate::registry::StepHandler;
use crate::result::{ErrorInfo, ErrorKind, Status};

/// How a guarded handler call ended.
#[derive(Debug)]
pub(crate) enum Outcome {
    Completed(Result<(), StepError>),
    Panicked(String),
    TimedOut(Duration),
}

impl Outcome {
    /// Status and error recorded for a step that ended this way.
    pub(crate) fn into_step_status(self) -> (Status, Option<ErrorInfo>) {
        match self {
            Self::Completed(Ok(())) => (Status::Passed, None),
            Self::Completed(Err(err)) if err.is_pending() => (
                Status::Pending,
                Some(ErrorInfo::new(ErrorKind::Pending, err.to_string())),
            ),
            Self::Completed(Err(err)) => (
                Status::Failed,
                Some(ErrorInfo::new(ErrorKind::Error, err.to_string())),
            ),
            Self::Panicked(message) => (
                Status::Failed,
                Some(ErrorInfo::new(ErrorKind::Panic, message)),
            ),
            Self::TimedOut(limit) => (
                Status::Failed,
                Some(ErrorInfo::new(
                    ErrorKind::Timeout,
                    format!("timed out after {} ms", limit.as_millis()),
                )),
            ),
        }
    }

    /// Error recorded for a hook that ended this way. Pending counts as a
    /// failure for hooks.
    pub(crate) fn into_hook_error(self) -> Option<ErrorInfo> {
        match self.into_step_status() {
            (Status::Passed, _) => None,
            (_, Some(error)) if error.kind == ErrorKind::Pending => {
                Some(ErrorInfo::new(ErrorKind::Error, error.message))
            }
            (_, error) => error,
        }
    }
}

async fn guarded(future: HandlerFuture<'_>, limit: Duration) -> Outcome {
    match tokio::time::timeout(limit, AssertUnwindSafe(future).catch_unwind()).await {
        Ok(Ok(result)) => Outcome::Completed(result),
        Ok(Err(payload)) => Outcome::Panicked(panic_message(payload.as_ref())),
        Err(_) => Outcome::TimedOut(limit),
    }
}

/// Call a step handler, catching panics raised while building or polling its
/// future.
pub(crate) async fn invoke_step<W>(
    handler: &StepHandler<W>,
    world: &mut W,
    ctx: &mut StepContext,
    limit: Duration,
) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(move || {
        let (world, ctx) = (world, ctx);
        handler(world, ctx)
    })) {
        Ok(future) => guarded(future, limit).await,
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    }
}

/// Call a hook handler under the same guards as a step.
pub(crate) async fn invoke_hook<W>(
    handler: &HookHandler<W>,
    ctx: &mut HookContext<W>,
    limit: Duration,
) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(move || {
        let ctx = ctx;
        handler(ctx)
    })) {
        Ok(future) => guarded(future, limit).await,
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    }
}

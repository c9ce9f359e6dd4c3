//! Future handle for operations scheduled on the blocking pool.
//!
//! # Invariants
//! - Work is already scheduled when a `PendingOperation` is returned.
//! - Operation errors come back unchanged inside `TaskError::Operation`.
//! - Dropping the handle does not cancel the scheduled work.

use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

/// Failure channel of an asynchronously dispatched operation.
#[derive(Debug)]
pub enum TaskError<E> {
    /// The operation ran and returned its own error.
    Operation(E),
    /// The scheduled task panicked or the runtime shut down under it.
    Join(JoinError),
    /// Dispatch happened outside a tokio runtime; nothing was scheduled.
    NoRuntime,
}

impl<E> TaskError<E> {
    /// Returns the operation's own error, if that is what failed.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Join(_) | Self::NoRuntime => None,
        }
    }
}

impl<E: Display> Display for TaskError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operation(err) => write!(f, "{err}"),
            Self::Join(err) => write!(f, "scheduled operation did not complete: {err}"),
            Self::NoRuntime => write!(f, "no async runtime available to schedule the operation"),
        }
    }
}

impl<E: Error + 'static> Error for TaskError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Join(err) => Some(err),
            Self::NoRuntime => None,
        }
    }
}

enum PendingState<T, E> {
    Scheduled(JoinHandle<Result<T, E>>),
    NoRuntime,
}

/// Resolves to the result of a dispatched operation.
#[must_use = "the operation result is only observable by awaiting the handle"]
pub struct PendingOperation<T, E> {
    state: PendingState<T, E>,
}

impl<T, E> PendingOperation<T, E> {
    /// Whether the work has finished; never blocks.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            PendingState::Scheduled(handle) => handle.is_finished(),
            PendingState::NoRuntime => true,
        }
    }
}

impl<T, E> Future for PendingOperation<T, E> {
    type Output = Result<T, TaskError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            PendingState::Scheduled(handle) => match Pin::new(handle).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
                Poll::Ready(Ok(Err(err))) => Poll::Ready(Err(TaskError::Operation(err))),
                Poll::Ready(Err(err)) => Poll::Ready(Err(TaskError::Join(err))),
            },
            PendingState::NoRuntime => Poll::Ready(Err(TaskError::NoRuntime)),
        }
    }
}

/// Schedules `work` on the current runtime's blocking pool.
pub(crate) fn schedule<T, E, F>(work: F) -> PendingOperation<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let state = match Handle::try_current() {
        Ok(handle) => PendingState::Scheduled(handle.spawn_blocking(work)),
        Err(_) => {
            debug!("event=repo_schedule module=repo status=no_runtime");
            PendingState::NoRuntime
        }
    };
    PendingOperation { state }
}

//! Blocking work that keeps logging to the caller's sink.
//!
//! Worker threads from `spawn_blocking` do not inherit the task's scoped
//! dispatcher, so closures are wrapped with the dispatcher and span that were
//! current when they were scheduled.

use tracing::{dispatcher, Dispatch, Span};

/// Wrap `f` so it runs under the dispatcher and span current at wrap time.
pub fn traced<F, R>(f: F) -> impl FnOnce() -> R + Send + 'static
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let dispatch: Dispatch = dispatcher::get_default(Dispatch::clone);
    let span = Span::current();
    move || dispatcher::with_default(&dispatch, || span.in_scope(f))
}

/// `tokio::task::spawn_blocking` for a [`traced`] closure.
pub fn spawn_traced<F, R>(f: F) -> tokio::task::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(traced(f))
}

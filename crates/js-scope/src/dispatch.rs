//! Inline-or-queued dispatch onto an engine thread.
//!
//! Work runs inline when the caller already is the engine thread; queueing it
//! there would leave a blocking caller waiting on itself. Otherwise it is
//! submitted to the executor and, for the blocking and awaitable forms, its
//! result comes back over a one-shot channel whose sender moves into the task.
//! A task that never runs (queue closed, task panicked) drops the sender and
//! the caller sees `None`.

use std::sync::mpsc as std_mpsc;

use tokio::sync::oneshot;

use crate::executor::TaskExecutor;

/// Run `work` on the engine thread without waiting for it.
pub(crate) fn post<F>(executor: &dyn TaskExecutor, work: F)
where
    F: FnOnce() + Send + 'static,
{
    if executor.is_current_thread() {
        work();
        return;
    }

    if let Err(e) = executor.submit(Box::new(work)) {
        tracing::warn!("[dispatch] Dropping task: {}", e);
    }
}

/// Run `work` on the engine thread and block until it has produced a result.
pub(crate) fn post_and_wait<R, F>(executor: &dyn TaskExecutor, work: F) -> Option<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    if executor.is_current_thread() {
        return Some(work());
    }

    let (reply_tx, reply_rx) = std_mpsc::sync_channel(1);
    let task = move || {
        let _ = reply_tx.send(work());
    };

    if let Err(e) = executor.submit(Box::new(task)) {
        tracing::warn!("[dispatch] Dropping blocking task: {}", e);
        return None;
    }

    reply_rx.recv().ok()
}

/// Run `work` on the engine thread and await its result.
pub(crate) async fn post_and_await<R, F>(executor: &dyn TaskExecutor, work: F) -> Option<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    if executor.is_current_thread() {
        return Some(work());
    }

    let (reply_tx, reply_rx) = oneshot::channel();
    let task = move || {
        let _ = reply_tx.send(work());
    };

    if let Err(e) = executor.submit(Box::new(task)) {
        tracing::warn!("[dispatch] Dropping awaited task: {}", e);
        return None;
    }

    reply_rx.await.ok()
}

//! Single-thread task executors.
//!
//! All script execution for an engine happens on one logical thread. The
//! [`TaskExecutor`] trait is what a scope sees of that thread; [`ThreadExecutor`]
//! is the stock implementation backed by a dedicated OS thread.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::ExecutorError;

/// A queued unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The engine's single logical thread.
pub trait TaskExecutor: Send + Sync {
    /// Whether the calling thread is the executor's thread.
    fn is_current_thread(&self) -> bool;

    /// Queue `task` behind every previously submitted task.
    ///
    /// On error the task is dropped without running.
    fn submit(&self, task: Task) -> Result<(), ExecutorError>;
}

/// Executor running tasks in FIFO order on a dedicated, named OS thread.
///
/// Shutting down closes the queue; tasks already queued still run before the
/// thread exits.
pub struct ThreadExecutor {
    name: String,
    /// Task sender, `None` once shut down
    task_tx: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    thread_id: ThreadId,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadExecutor {
    /// Spawn the executor thread.
    pub fn spawn(name: impl Into<String>) -> Result<Self, ExecutorError> {
        let name = name.into();
        let (task_tx, mut task_rx) = mpsc::unbounded_channel::<Task>();

        let name_clone = name.clone();
        let thread_handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::debug!("[executor:{}] Thread started", name_clone);

                while let Some(task) = task_rx.blocking_recv() {
                    // A panicking task drops its reply sender while unwinding,
                    // so a blocked caller is released with "no value".
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::error!("[executor:{}] Task panicked", name_clone);
                    }
                }

                tracing::debug!("[executor:{}] Queue closed, thread exiting", name_clone);
            })?;

        Ok(Self {
            name,
            task_tx: Mutex::new(Some(task_tx)),
            thread_id: thread_handle.thread().id(),
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_shutdown(&self) -> bool {
        self.task_tx.lock().is_none()
    }

    /// Close the queue and wait for the thread to drain it.
    ///
    /// Called from the executor thread itself this only closes the queue.
    pub fn shutdown(&self) {
        if self.task_tx.lock().take().is_some() {
            tracing::debug!("[executor:{}] Shutting down", self.name);
        }

        if self.is_current_thread() {
            return;
        }

        let handle = self.thread_handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("[executor:{}] Thread panicked", self.name);
            }
        }
    }
}

impl TaskExecutor for ThreadExecutor {
    fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn submit(&self, task: Task) -> Result<(), ExecutorError> {
        let guard = self.task_tx.lock();
        let task_tx = guard.as_ref().ok_or(ExecutorError::Closed)?;
        task_tx.send(task).map_err(|_| ExecutorError::Closed)
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

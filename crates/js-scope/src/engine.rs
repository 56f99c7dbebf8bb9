//! Engine abstraction and the stock threaded engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::ExecutorError;
use crate::executor::{TaskExecutor, ThreadExecutor};

/// A scripting runtime that hosts scopes.
///
/// The engine outlives every scope bound to it. Scopes `enter` it when they
/// initialize and `exit` it when they are dropped.
pub trait Engine: Send + Sync {
    type Context: ExecutionContext;

    fn enter(&self);

    fn exit(&self);

    /// The single thread all script execution must happen on.
    fn task_executor(&self) -> Arc<dyn TaskExecutor>;

    /// Create a fresh execution context. Called on the engine thread.
    fn create_context(&self) -> Option<Self::Context>;
}

type ContextFactory<C> = Box<dyn Fn() -> Option<C> + Send + Sync + 'static>;

/// Engine running on a dedicated [`ThreadExecutor`], creating contexts with a
/// host-supplied factory.
pub struct ThreadedEngine<C: ExecutionContext> {
    executor: Arc<ThreadExecutor>,
    factory: ContextFactory<C>,
    scopes: AtomicUsize,
}

impl<C: ExecutionContext> ThreadedEngine<C> {
    /// Spawn the engine thread named by `config`.
    pub fn spawn<F>(config: &EngineConfig, factory: F) -> Result<Arc<Self>, ExecutorError>
    where
        F: Fn() -> Option<C> + Send + Sync + 'static,
    {
        let executor = ThreadExecutor::spawn(config.thread_name.clone())?;
        tracing::info!("[engine:{}] Engine thread spawned", config.thread_name);

        Ok(Arc::new(Self {
            executor: Arc::new(executor),
            factory: Box::new(factory),
            scopes: AtomicUsize::new(0),
        }))
    }

    /// Number of scopes currently entered.
    pub fn active_scopes(&self) -> usize {
        self.scopes.load(Ordering::SeqCst)
    }

    pub fn executor(&self) -> &Arc<ThreadExecutor> {
        &self.executor
    }
}

impl<C: ExecutionContext> Engine for ThreadedEngine<C> {
    type Context = C;

    fn enter(&self) {
        let count = self.scopes.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("[engine:{}] Enter ({} active)", self.executor.name(), count);
    }

    fn exit(&self) {
        let previous = self
            .scopes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(n) => tracing::debug!("[engine:{}] Exit ({} active)", self.executor.name(), n - 1),
            Err(_) => tracing::warn!(
                "[engine:{}] Exit without matching enter",
                self.executor.name()
            ),
        }
    }

    fn task_executor(&self) -> Arc<dyn TaskExecutor> {
        self.executor.clone()
    }

    fn create_context(&self) -> Option<C> {
        (self.factory)()
    }
}

//! Error types for scopes, script execution and task executors.

use crate::scope::ScopeState;

/// Errors returned by scope lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("Scope '{name}' is {actual:?}, expected {expected:?}")]
    InvalidState {
        name: String,
        actual: ScopeState,
        expected: ScopeState,
    },

    #[error("Engine could not create an execution context")]
    ContextCreationFailure,

    #[error("Bootstrap '{resource}' did not evaluate to a callable: {reason}")]
    BootstrapNotCallable { resource: String, reason: String },

    #[error("Task executor is unavailable")]
    ExecutorUnavailable,
}

impl ScopeError {
    /// Whether the host must stop using the scope altogether.
    ///
    /// Only a broken bootstrap is fatal: every later native/script binding
    /// assumes the bootstrap installed itself.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScopeError::BootstrapNotCallable { .. })
    }
}

/// Errors reported by an execution context or a native function bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("Uncaught exception in {name}: {message}")]
    Exception { name: String, message: String },

    #[error("Value is not callable")]
    NotCallable,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Scope has been released")]
    ScopeReleased,
}

/// Errors that can occur when handing work to a task executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Task queue closed")]
    Closed,

    #[error("Failed to spawn thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

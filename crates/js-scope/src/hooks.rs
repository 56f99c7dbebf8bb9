//! One-shot lifecycle hooks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::scope::Scope;

/// Named points in scope initialization where the host can run native code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKey {
    /// Right after the execution context has been created.
    ContextCreated,
    /// After the bootstrap script has run and the scope is active.
    ScopeInitialized,
}

/// Callback fired once with the scope that reached the hook point.
pub type Hook<C> = Box<dyn FnOnce(&Arc<Scope<C>>) + Send + 'static>;

/// Table of pending lifecycle hooks.
///
/// Hooks are `FnOnce`: taking one removes it, so each fires at most once.
pub struct HookTable<C: ExecutionContext> {
    hooks: HashMap<HookKey, Hook<C>>,
}

impl<C: ExecutionContext> Default for HookTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ExecutionContext> HookTable<C> {
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    /// Register `hook` under `key`, replacing any pending hook for that key.
    pub fn insert<F>(&mut self, key: HookKey, hook: F)
    where
        F: FnOnce(&Arc<Scope<C>>) + Send + 'static,
    {
        self.hooks.insert(key, Box::new(hook));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<F>(mut self, key: HookKey, hook: F) -> Self
    where
        F: FnOnce(&Arc<Scope<C>>) + Send + 'static,
    {
        self.insert(key, hook);
        self
    }

    /// Remove and return the hook for `key`.
    pub fn take(&mut self, key: HookKey) -> Option<Hook<C>> {
        self.hooks.remove(&key)
    }

    pub fn contains(&self, key: HookKey) -> bool {
        self.hooks.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<C: ExecutionContext> fmt::Debug for HookTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.hooks.keys()).finish()
    }
}

//! Native modules and the module registry.
//!
//! The registry is built once by the host at startup and handed to every
//! scope's `initialize`. Global modules are installed straight into the
//! execution context; internal modules are instantiated per scope and only
//! reachable through the internal binding accessor.

use std::fmt;
use std::sync::Arc;

use crate::binding::NativeFunction;
use crate::context::ExecutionContext;
use crate::error::ScriptError;
use crate::scope::Scope;

/// A native module instance owned by a scope.
pub trait ModuleClass<C: ExecutionContext>: Send + Sync + 'static {
    /// Produce the script value handed out by the internal binding accessor.
    fn bind(&self, scope: &Arc<Scope<C>>, context: &C) -> Result<C::Value, ScriptError>;
}

/// Creates a fresh internal module instance for one scope.
pub type ModuleFactory<C> = Box<dyn Fn() -> Box<dyn ModuleClass<C>> + Send + Sync + 'static>;

/// A module installed as a global object of native functions.
pub struct GlobalModule<C: ExecutionContext> {
    name: String,
    functions: Vec<(String, NativeFunction<C>)>,
}

impl<C: ExecutionContext> GlobalModule<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    /// Add a function exposed as `<module>.<name>`.
    pub fn with_function(mut self, name: impl Into<String>, function: NativeFunction<C>) -> Self {
        self.functions.push((name.into(), function));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &[(String, NativeFunction<C>)] {
        &self.functions
    }
}

impl<C: ExecutionContext> fmt::Debug for GlobalModule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalModule")
            .field("name", &self.name)
            .field(
                "functions",
                &self.functions.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Process-wide table of native modules available to scopes.
pub struct ModuleRegistry<C: ExecutionContext> {
    global: Vec<GlobalModule<C>>,
    internal: Vec<(String, ModuleFactory<C>)>,
}

impl<C: ExecutionContext> Default for ModuleRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ExecutionContext> ModuleRegistry<C> {
    pub fn new() -> Self {
        Self {
            global: Vec::new(),
            internal: Vec::new(),
        }
    }

    /// Register a module installed into every scope's globals.
    pub fn register_global(&mut self, module: GlobalModule<C>) {
        self.global.push(module);
    }

    /// Register an internal module created per scope by `factory`.
    pub fn register_internal<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ModuleClass<C>> + Send + Sync + 'static,
    {
        self.internal.push((name.into(), Box::new(factory)));
    }

    pub fn global_modules(&self) -> &[GlobalModule<C>] {
        &self.global
    }

    /// Instantiate every internal module, in registration order.
    pub fn instantiate_internal(
        &self,
    ) -> impl Iterator<Item = (&str, Box<dyn ModuleClass<C>>)> + '_ {
        self.internal
            .iter()
            .map(|(name, factory)| (name.as_str(), factory()))
    }

    pub fn internal_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.internal.iter().map(|(name, _)| name.as_str())
    }
}

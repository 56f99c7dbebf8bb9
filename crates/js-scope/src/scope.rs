//! Scope lifecycle and cross-thread script dispatch.
//!
//! A [`Scope`] owns one execution context for its whole life. The context
//! lives on the engine thread; every entry point here may be called from any
//! thread and either runs inline (already on the engine thread) or is queued
//! onto it. Queued work only ever holds a weak handle to the context, so a
//! scope torn down while work is in flight leaves that work as a no-op.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::binding::{self, FunctionData, NativeFunction};
use crate::config::ScopeConfig;
use crate::context::{ExecutionContext, ScriptSource};
use crate::dispatch;
use crate::engine::Engine;
use crate::error::{ScopeError, ScriptError};
use crate::executor::TaskExecutor;
use crate::hooks::{HookKey, HookTable};
use crate::listener::ListenerTable;
use crate::module::{ModuleClass, ModuleRegistry};
use crate::resource::{EmbeddedResources, ResourceLoader};

/// Lifecycle state of a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Constructed, not yet initialized
    Created,
    /// `initialize` is running on the engine thread
    Initializing,
    /// Bootstrap done, accepting scripts
    Active,
    /// `will_exit` has been called
    Exiting,
    /// Context released
    Destroyed,
    /// Initialization aborted; the scope is unusable
    Failed,
}

/// One embedded-scripting realm bound to an engine.
pub struct Scope<C: ExecutionContext> {
    name: String,
    config: ScopeConfig,
    engine: Arc<dyn Engine<Context = C>>,
    executor: Arc<dyn TaskExecutor>,
    resources: Arc<dyn ResourceLoader>,
    context: RwLock<Option<Arc<C>>>,
    state: Mutex<ScopeState>,
    /// Whether this scope called `engine.enter()`
    entered: AtomicBool,
    hooks: Mutex<HookTable<C>>,
    module_classes: RwLock<HashMap<String, Arc<dyn ModuleClass<C>>>>,
    module_values: RwLock<HashMap<String, C::Value>>,
    /// Append-only; script may hold any exposed function until the end
    function_data: Mutex<Vec<Arc<FunctionData<C>>>>,
    listeners: Mutex<ListenerTable>,
}

/// Builder for [`Scope`].
pub struct ScopeBuilder<C: ExecutionContext> {
    engine: Arc<dyn Engine<Context = C>>,
    config: ScopeConfig,
    hooks: HookTable<C>,
    resources: Arc<dyn ResourceLoader>,
}

impl<C: ExecutionContext> ScopeBuilder<C> {
    pub fn new(engine: Arc<dyn Engine<Context = C>>) -> Self {
        Self {
            engine,
            config: ScopeConfig::default(),
            hooks: HookTable::new(),
            resources: Arc::new(EmbeddedResources::new()),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn config(mut self, config: ScopeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(mut self, hooks: HookTable<C>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn resources(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
        self.resources = resources;
        self
    }

    pub fn build(self) -> Arc<Scope<C>> {
        let executor = self.engine.task_executor();
        tracing::debug!("[scope:{}] Created", self.config.name);

        Arc::new(Scope {
            name: self.config.name.clone(),
            config: self.config,
            engine: self.engine,
            executor,
            resources: self.resources,
            context: RwLock::new(None),
            state: Mutex::new(ScopeState::Created),
            entered: AtomicBool::new(false),
            hooks: Mutex::new(self.hooks),
            module_classes: RwLock::new(HashMap::new()),
            module_values: RwLock::new(HashMap::new()),
            function_data: Mutex::new(Vec::new()),
            listeners: Mutex::new(ListenerTable::new()),
        })
    }
}

impl<C: ExecutionContext> Scope<C> {
    /// Create a scope with default configuration and no embedded resources.
    pub fn new(
        engine: Arc<dyn Engine<Context = C>>,
        name: impl Into<String>,
        hooks: HookTable<C>,
    ) -> Arc<Self> {
        ScopeBuilder::new(engine).name(name).hooks(hooks).build()
    }

    pub fn builder(engine: Arc<dyn Engine<Context = C>>) -> ScopeBuilder<C> {
        ScopeBuilder::new(engine)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn state(&self) -> ScopeState {
        *self.state.lock()
    }

    /// Whether the hook for `key` is still pending.
    pub fn has_hook(&self, key: HookKey) -> bool {
        self.hooks.lock().contains(key)
    }

    // ---- Lifecycle ----

    /// Create the execution context and run the bootstrap.
    ///
    /// Runs on the engine thread and blocks the caller until it is done.
    /// A [`ScopeError::BootstrapNotCallable`] is fatal: the scope is left
    /// `Failed` and must not be used further.
    pub fn initialize(
        self: &Arc<Self>,
        registry: &Arc<ModuleRegistry<C>>,
    ) -> Result<(), ScopeError> {
        let scope = self.clone();
        let registry = registry.clone();

        dispatch::post_and_wait(self.executor.as_ref(), move || {
            scope.initialize_on_engine_thread(&registry)
        })
        .ok_or(ScopeError::ExecutorUnavailable)?
    }

    fn initialize_on_engine_thread(
        self: &Arc<Self>,
        registry: &ModuleRegistry<C>,
    ) -> Result<(), ScopeError> {
        self.transition(ScopeState::Created, ScopeState::Initializing)?;
        tracing::debug!("[scope:{}] Initializing", self.name);

        self.engine.enter();
        self.entered.store(true, Ordering::SeqCst);

        let Some(context) = self.engine.create_context() else {
            tracing::error!("[scope:{}] Engine failed to create a context", self.name);
            self.fail();
            return Err(ScopeError::ContextCreationFailure);
        };
        *self.context.write() = Some(Arc::new(context));

        self.fire_hook(HookKey::ContextCreated);

        let Some(context) = self.live_context() else {
            tracing::warn!("[scope:{}] Context released during initialization", self.name);
            return Ok(());
        };

        context.install_global_modules(self, registry.global_modules());
        for (name, module) in registry.instantiate_internal() {
            self.add_module_class(name, module);
        }

        let bootstrap = self.load_bootstrap(&context)?;
        let result = binding::internal_binding_fn(self, &context)
            .and_then(|accessor| context.call_function(&bootstrap, &[accessor]));
        if let Err(e) = result {
            tracing::warn!("[scope:{}] Bootstrap raised: {}", self.name, e);
        }

        self.set_state(ScopeState::Active);
        tracing::info!("[scope:{}] Active", self.name);

        self.fire_hook(HookKey::ScopeInitialized);
        Ok(())
    }

    /// Evaluate the bootstrap resource, which must produce a callable.
    fn load_bootstrap(&self, context: &C) -> Result<C::Value, ScopeError> {
        let resource = &self.config.bootstrap;

        let outcome = match self.resources.embedded_source(resource) {
            None => Err("resource not found".to_string()),
            Some(source) => match context.run_script(&source, resource) {
                Ok(value) if context.is_callable(&value) => Ok(value),
                Ok(_) => Err("result is not callable".to_string()),
                Err(e) => Err(e.to_string()),
            },
        };

        outcome.map_err(|reason| {
            tracing::error!("[scope:{}] Bootstrap '{}' unusable: {}", self.name, resource, reason);
            self.fail();
            ScopeError::BootstrapNotCallable {
                resource: resource.clone(),
                reason,
            }
        })
    }

    /// Call the script-side deallocation function, if it is defined.
    ///
    /// Blocks until the call has finished on the engine thread.
    pub fn will_exit(&self) {
        let context = self.weak_context();
        let function_name = self.config.dealloc_function.clone();
        let scope_name = self.name.clone();

        dispatch::post_and_wait(self.executor.as_ref(), move || {
            let Some(context) = context.upgrade() else {
                tracing::debug!("[scope:{}] No context at exit", scope_name);
                return;
            };

            match context.named_global(&function_name) {
                Some(function) if context.is_callable(&function) => {
                    if let Err(e) = context.call_function(&function, &[]) {
                        tracing::warn!("[scope:{}] {} raised: {}", scope_name, function_name, e);
                    }
                }
                _ => tracing::debug!("[scope:{}] No callable {}", scope_name, function_name),
            }
        });

        let mut state = self.state.lock();
        if *state == ScopeState::Active {
            *state = ScopeState::Exiting;
        }
    }

    // ---- Script execution ----

    /// Queue `source` for evaluation and return immediately.
    ///
    /// Failures are logged; nothing runs once the context is gone.
    pub fn run_js(&self, source: impl Into<ScriptSource>, name: &str) {
        let source = source.into();
        let name = name.to_string();
        let context = self.weak_context();
        let scope_name = self.name.clone();

        dispatch::post(self.executor.as_ref(), move || {
            evaluate(&context, &source, &name, &scope_name);
        });
    }

    /// Evaluate `source` on the engine thread and wait for its value.
    ///
    /// Returns `None` if the script failed or the context is gone.
    pub fn run_js_sync(&self, source: impl Into<ScriptSource>, name: &str) -> Option<C::Value> {
        let source = source.into();
        let name = name.to_string();
        let context = self.weak_context();
        let scope_name = self.name.clone();

        dispatch::post_and_wait(self.executor.as_ref(), move || {
            evaluate(&context, &source, &name, &scope_name)
        })
        .flatten()
    }

    /// Awaitable form of [`run_js_sync`](Self::run_js_sync).
    pub async fn run_js_async(
        &self,
        source: impl Into<ScriptSource>,
        name: &str,
    ) -> Option<C::Value> {
        let source = source.into();
        let name = name.to_string();
        let context = self.weak_context();
        let scope_name = self.name.clone();

        dispatch::post_and_await(self.executor.as_ref(), move || {
            evaluate(&context, &source, &name, &scope_name)
        })
        .await
        .flatten()
    }

    // ---- Registries ----

    /// Store a module instance under `name`. The first registration wins.
    pub fn add_module_class(&self, name: &str, module: Box<dyn ModuleClass<C>>) -> bool {
        match self.module_classes.write().entry(name.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!("[scope:{}] Module class {} already registered", self.name, name);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::from(module));
                true
            }
        }
    }

    pub fn get_module_class(&self, name: &str) -> Option<Arc<dyn ModuleClass<C>>> {
        self.module_classes.read().get(name).cloned()
    }

    /// Store the script value of module `name`. The first value wins.
    pub fn add_module_value(&self, name: &str, value: C::Value) -> bool {
        match self.module_values.write().entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn get_module_value(&self, name: &str) -> Option<C::Value> {
        self.module_values.read().get(name).cloned()
    }

    /// Retain a function bridge for the rest of the scope's life.
    pub fn save_function_data(&self, data: Arc<FunctionData<C>>) {
        self.function_data.lock().push(data);
    }

    pub fn function_data_count(&self) -> usize {
        self.function_data.lock().len()
    }

    /// Expose `callback` to script as a function value named `name`.
    ///
    /// The bridge is retained by this scope.
    pub fn expose_function(
        self: &Arc<Self>,
        context: &C,
        name: &str,
        callback: NativeFunction<C>,
    ) -> Result<C::Value, ScriptError> {
        let data = Arc::new(FunctionData::new(name, Arc::downgrade(self), callback));
        self.save_function_data(data.clone());
        context.create_function(data)
    }

    /// Record the listener for (`node_id`, `event_name`), replacing any
    /// previous one.
    pub fn add_listener(&self, node_id: u32, event_name: &str, listener_id: u32) {
        self.listeners.lock().insert(node_id, event_name, listener_id);
    }

    /// Listener id for (`node_id`, `event_name`), or `0` if none.
    pub fn get_listener_id(&self, node_id: u32, event_name: &str) -> u32 {
        self.listeners.lock().get(node_id, event_name)
    }

    // ---- Internals ----

    fn transition(&self, from: ScopeState, to: ScopeState) -> Result<(), ScopeError> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(ScopeError::InvalidState {
                name: self.name.clone(),
                actual: *state,
                expected: from,
            });
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, state: ScopeState) {
        *self.state.lock() = state;
    }

    /// Mark the scope unusable. Queued and later work sees no context.
    fn fail(&self) {
        self.set_state(ScopeState::Failed);
        drop(self.release_context());
    }

    fn live_context(&self) -> Option<Arc<C>> {
        self.context.read().clone()
    }

    fn weak_context(&self) -> Weak<C> {
        self.context
            .read()
            .as_ref()
            .map(Arc::downgrade)
            .unwrap_or_default()
    }

    /// Take the context out of the scope. Queued work sees it as gone.
    pub(crate) fn release_context(&self) -> Option<Arc<C>> {
        self.context.write().take()
    }

    fn fire_hook(self: &Arc<Self>, key: HookKey) {
        let hook = self.hooks.lock().take(key);
        match hook {
            Some(hook) => {
                tracing::debug!("[scope:{}] Firing {:?} hook", self.name, key);
                hook(self);
            }
            None => tracing::debug!("[scope:{}] No {:?} hook", self.name, key),
        }
    }
}

/// Run a script against a weakly held context.
fn evaluate<C: ExecutionContext>(
    context: &Weak<C>,
    source: &ScriptSource,
    name: &str,
    scope_name: &str,
) -> Option<C::Value> {
    let Some(context) = context.upgrade() else {
        tracing::debug!("[scope:{}] Context gone, skipping {}", scope_name, name);
        return None;
    };

    match context.run_script(source, name) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[scope:{}] {}", scope_name, e);
            None
        }
    }
}

impl<C: ExecutionContext> Drop for Scope<C> {
    fn drop(&mut self) {
        drop(self.release_context());
        *self.state.get_mut() = ScopeState::Destroyed;

        if self.entered.load(Ordering::SeqCst) {
            self.engine.exit();
        }
        tracing::debug!("[scope:{}] Destroyed", self.name);
    }
}

impl<C: ExecutionContext> fmt::Debug for Scope<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("has_context", &self.context.read().is_some())
            .finish()
    }
}

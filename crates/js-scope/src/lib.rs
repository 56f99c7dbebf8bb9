//! JS Scope
//!
//! Lifecycle and cross-thread execution coordinator for one embedded
//! scripting realm (a "scope") inside a host application.
//!
//! # Architecture
//!
//! - Each engine runs all script execution on one dedicated thread
//! - A scope owns exactly one execution context on that thread
//! - Host threads call into the scope; work runs inline on the engine thread
//!   and is queued (FIFO) from anywhere else
//! - Queued work holds the context weakly, so teardown never races in-flight
//!   calls
//! - Registries (modules, module values, function bridges, listener ids) live
//!   exactly as long as the scope
//!
//! # Example
//!
//! ```ignore
//! let engine = ThreadedEngine::spawn(&config.engine, || MyContext::new())?;
//! let scope = Scope::builder(engine.clone())
//!     .config(config.scope.clone())
//!     .resources(Arc::new(EmbeddedResources::new().with("bootstrap.js", BOOTSTRAP)))
//!     .build();
//!
//! scope.initialize(&registry)?;
//! scope.run_js("render()", "app.js");
//! let title = scope.run_js_sync("document.title", "title.js");
//! scope.will_exit();
//! ```

mod binding;
mod config;
mod context;
mod dispatch;
mod engine;
mod error;
mod executor;
mod hooks;
mod listener;
mod module;
mod resource;
mod scope;

#[cfg(test)]
mod test_support;

pub use binding::{FunctionData, INTERNAL_BINDING_NAME, NativeFunction, native_function};
pub use config::{Config, ConfigError, EngineConfig, ScopeConfig};
pub use context::{ExecutionContext, ScriptSource};
pub use engine::{Engine, ThreadedEngine};
pub use error::{ExecutorError, ScopeError, ScriptError};
pub use executor::{Task, TaskExecutor, ThreadExecutor};
pub use hooks::{Hook, HookKey, HookTable};
pub use listener::{INVALID_LISTENER_ID, ListenerTable};
pub use module::{GlobalModule, ModuleClass, ModuleFactory, ModuleRegistry};
pub use resource::{EmbeddedResources, ResourceLoader};
pub use scope::{Scope, ScopeBuilder, ScopeState};

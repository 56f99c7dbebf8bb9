//! Native function bridges and the internal binding accessor.
//!
//! A [`FunctionData`] is the native half of a script-callable function. The
//! scope that exposed it keeps it alive for its whole life, since script may
//! hold the function value at any time.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::context::ExecutionContext;
use crate::error::ScriptError;
use crate::scope::Scope;

/// Name under which the internal binding accessor is exposed.
pub const INTERNAL_BINDING_NAME: &str = "internalBinding";

/// Native callback invoked when script calls a bridged function.
pub type NativeFunction<C> = Arc<
    dyn Fn(
            &Arc<Scope<C>>,
            &C,
            &[<C as ExecutionContext>::Value],
        ) -> Result<<C as ExecutionContext>::Value, ScriptError>
        + Send
        + Sync
        + 'static,
>;

/// Wrap a closure as a [`NativeFunction`].
pub fn native_function<C, F>(callback: F) -> NativeFunction<C>
where
    C: ExecutionContext,
    F: Fn(&Arc<Scope<C>>, &C, &[C::Value]) -> Result<C::Value, ScriptError> + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Adapter between a script function value and a native callback.
pub struct FunctionData<C: ExecutionContext> {
    name: String,
    scope: Weak<Scope<C>>,
    callback: NativeFunction<C>,
}

impl<C: ExecutionContext> FunctionData<C> {
    pub fn new(
        name: impl Into<String>,
        scope: Weak<Scope<C>>,
        callback: NativeFunction<C>,
    ) -> Self {
        Self {
            name: name.into(),
            scope,
            callback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the native callback on behalf of script.
    ///
    /// Fails with [`ScriptError::ScopeReleased`] once the owning scope is
    /// gone.
    pub fn invoke(&self, context: &C, args: &[C::Value]) -> Result<C::Value, ScriptError> {
        let scope = self.scope.upgrade().ok_or(ScriptError::ScopeReleased)?;
        (self.callback)(&scope, context, args)
    }
}

impl<C: ExecutionContext> fmt::Debug for FunctionData<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("scope_alive", &(self.scope.strong_count() > 0))
            .finish()
    }
}

/// Build the accessor script uses to reach internal modules by name.
///
/// Each module is bound on first request and cached in the scope's module
/// value table, so later requests share one script value.
pub(crate) fn internal_binding_fn<C: ExecutionContext>(
    scope: &Arc<Scope<C>>,
    context: &C,
) -> Result<C::Value, ScriptError> {
    let callback = native_function(|scope: &Arc<Scope<C>>, context: &C, args: &[C::Value]| {
        let module_name = args
            .first()
            .and_then(|arg| context.string_value(arg))
            .ok_or_else(|| {
                ScriptError::InvalidArgument(format!(
                    "{} expects a module name",
                    INTERNAL_BINDING_NAME
                ))
            })?;

        if let Some(value) = scope.get_module_value(&module_name) {
            return Ok(value);
        }

        let module = scope
            .get_module_class(&module_name)
            .ok_or_else(|| ScriptError::ModuleNotFound(module_name.clone()))?;

        tracing::debug!("[scope:{}] Binding internal module {}", scope.name(), module_name);
        let value = module.bind(scope, context)?;
        // A nested request for the same module during `bind` may have
        // cached first; hand out whatever the table holds.
        scope.add_module_value(&module_name, value.clone());
        Ok(scope.get_module_value(&module_name).unwrap_or(value))
    });

    scope.expose_function(context, INTERNAL_BINDING_NAME, callback)
}

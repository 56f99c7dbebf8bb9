//! The execution context seam.
//!
//! A scope never talks to a scripting engine directly. Everything it needs
//! from one live script environment goes through [`ExecutionContext`], so the
//! dispatch core stays identical whichever engine is compiled in.

use std::borrow::Cow;
use std::sync::Arc;

use crate::binding::FunctionData;
use crate::error::ScriptError;
use crate::module::GlobalModule;
use crate::scope::Scope;

/// Script source text handed to [`ExecutionContext::run_script`].
///
/// Static sources (embedded resources, literals) are borrowed for the whole
/// program and never copied; owned sources were copied in by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource(Cow<'static, str>);

impl ScriptSource {
    /// Source with `'static` lifetime; no copy is made.
    pub const fn from_static(text: &'static str) -> Self {
        Self(Cow::Borrowed(text))
    }

    /// Source owned by this value.
    pub fn owned(text: impl Into<String>) -> Self {
        Self(Cow::Owned(text.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the text was copied into this value.
    ///
    /// Engines that can run external strings may skip their own copy when
    /// this is false.
    pub fn is_copied(&self) -> bool {
        matches!(self.0, Cow::Owned(_))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for ScriptSource {
    fn from(text: &'static str) -> Self {
        Self::from_static(text)
    }
}

impl From<String> for ScriptSource {
    fn from(text: String) -> Self {
        Self::owned(text)
    }
}

/// One live script execution environment.
///
/// Implementations are only ever driven from their engine's task thread;
/// `Send + Sync` is required because the owning [`Scope`] is shared with
/// other threads, not because methods run concurrently.
pub trait ExecutionContext: Send + Sync + Sized + 'static {
    /// Engine value handle. Cloning shares the underlying script value.
    type Value: Clone + Send + Sync + 'static;

    /// Evaluate `source`, labelled `name` in diagnostics.
    fn run_script(&self, source: &ScriptSource, name: &str) -> Result<Self::Value, ScriptError>;

    /// Call `function` with `args`.
    fn call_function(
        &self,
        function: &Self::Value,
        args: &[Self::Value],
    ) -> Result<Self::Value, ScriptError>;

    fn is_callable(&self, value: &Self::Value) -> bool;

    /// Look up a global binding; `None` when it is not defined.
    fn named_global(&self, name: &str) -> Option<Self::Value>;

    /// Install native-backed globals described by `modules`.
    ///
    /// Implementations expose each function through
    /// [`Scope::expose_function`] so the bridge is retained by the scope.
    fn install_global_modules(&self, scope: &Arc<Scope<Self>>, modules: &[GlobalModule<Self>]);

    /// Wrap a native function bridge as a callable script value.
    fn create_function(&self, data: Arc<FunctionData<Self>>) -> Result<Self::Value, ScriptError>;

    /// String contents of `value`, if it is a string.
    fn string_value(&self, value: &Self::Value) -> Option<String>;

    fn undefined(&self) -> Self::Value;
}

//! Scripted stand-in for a real execution context.
//!
//! Each script is a single command:
//!
//! | source            | effect                                                     |
//! |-------------------|------------------------------------------------------------|
//! | `bootstrap`       | a function journaling `bootstrap`; stores arg 0 globally   |
//! | `bootstrap-throws`| a function that throws when called                         |
//! | `number:N`        | the number `N`                                             |
//! | `global:NAME`     | the global `NAME`, or throws                               |
//! | `set:NAME=TEXT`   | stores the string `TEXT` as global `NAME`                  |
//! | `define:NAME`     | stores a function journaling `call:NAME` as global `NAME`  |
//! | `call:NAME:ARG`   | calls global `NAME` with the string `ARG`                  |
//! | `append:TEXT`     | journals `TEXT`                                            |
//! | `sleep:MS`        | sleeps for `MS` milliseconds                               |
//! | `thread`          | the name of the running thread                             |
//! | `throw:MESSAGE`   | throws `MESSAGE`                                           |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::binding::FunctionData;
use crate::config::EngineConfig;
use crate::context::{ExecutionContext, ScriptSource};
use crate::engine::ThreadedEngine;
use crate::error::ScriptError;
use crate::hooks::HookTable;
use crate::module::GlobalModule;
use crate::resource::EmbeddedResources;
use crate::scope::Scope;

/// Ordered record of script side effects, shared with the test.
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

pub(crate) type FakeFunction =
    Arc<dyn Fn(&FakeContext, &[FakeValue]) -> Result<FakeValue, ScriptError> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum FakeValue {
    Undefined,
    Number(f64),
    Str(String),
    Function(FakeFunction),
}

impl PartialEq for FakeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FakeValue::Undefined, FakeValue::Undefined) => true,
            (FakeValue::Number(a), FakeValue::Number(b)) => a == b,
            (FakeValue::Str(a), FakeValue::Str(b)) => a == b,
            (FakeValue::Function(a), FakeValue::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FakeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FakeValue::Undefined => write!(f, "undefined"),
            FakeValue::Number(n) => write!(f, "{n}"),
            FakeValue::Str(s) => write!(f, "{s:?}"),
            FakeValue::Function(_) => write!(f, "[function]"),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeContext {
    globals: Mutex<HashMap<String, FakeValue>>,
    journal: Journal,
}

impl FakeContext {
    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            globals: Mutex::new(HashMap::new()),
            journal,
        }
    }

    fn set_global(&self, name: &str, value: FakeValue) {
        self.globals.lock().insert(name.to_string(), value);
    }

    fn exception(name: &str, message: impl Into<String>) -> ScriptError {
        ScriptError::Exception {
            name: name.to_string(),
            message: message.into(),
        }
    }

    fn journaling_function(&self, entry: String) -> FakeValue {
        let journal = self.journal.clone();
        FakeValue::Function(Arc::new(move |context: &FakeContext, _: &[FakeValue]| {
            journal.lock().push(entry.clone());
            Ok(context.undefined())
        }))
    }
}

impl ExecutionContext for FakeContext {
    type Value = FakeValue;

    fn run_script(&self, source: &ScriptSource, name: &str) -> Result<FakeValue, ScriptError> {
        let text = source.as_str();
        let (command, rest) = text.split_once(':').unwrap_or((text, ""));

        match command {
            "bootstrap" => {
                let journal = self.journal.clone();
                Ok(FakeValue::Function(Arc::new(
                    move |context: &FakeContext, args: &[FakeValue]| {
                        journal.lock().push("bootstrap".to_string());
                        if let Some(binding) = args.first() {
                            context.set_global("internalBinding", binding.clone());
                        }
                        Ok(context.undefined())
                    },
                )))
            }
            "bootstrap-throws" => Ok(FakeValue::Function(Arc::new(
                |_: &FakeContext, _: &[FakeValue]| {
                    Err(FakeContext::exception("bootstrap", "setup failed"))
                },
            ))),
            "number" => rest
                .parse()
                .map(FakeValue::Number)
                .map_err(|_| Self::exception(name, format!("not a number: {rest}"))),
            "global" => self
                .named_global(rest)
                .ok_or_else(|| Self::exception(name, format!("{rest} is not defined"))),
            "set" => {
                let (key, value) = rest.split_once('=').unwrap_or((rest, ""));
                self.set_global(key, FakeValue::Str(value.to_string()));
                Ok(FakeValue::Undefined)
            }
            "define" => {
                let function = self.journaling_function(format!("call:{rest}"));
                self.set_global(rest, function);
                Ok(FakeValue::Undefined)
            }
            "call" => {
                let (target, arg) = rest.split_once(':').unwrap_or((rest, ""));
                let function = self
                    .named_global(target)
                    .ok_or_else(|| Self::exception(name, format!("{target} is not defined")))?;
                self.call_function(&function, &[FakeValue::Str(arg.to_string())])
            }
            "append" => {
                self.journal.lock().push(rest.to_string());
                Ok(FakeValue::Undefined)
            }
            "sleep" => {
                let millis = rest.parse().unwrap_or(0);
                thread::sleep(Duration::from_millis(millis));
                Ok(FakeValue::Undefined)
            }
            "thread" => Ok(FakeValue::Str(
                thread::current().name().unwrap_or_default().to_string(),
            )),
            "throw" => Err(Self::exception(name, rest)),
            _ => Err(Self::exception(name, format!("unknown command: {text}"))),
        }
    }

    fn call_function(
        &self,
        function: &FakeValue,
        args: &[FakeValue],
    ) -> Result<FakeValue, ScriptError> {
        match function {
            FakeValue::Function(f) => f(self, args),
            _ => Err(ScriptError::NotCallable),
        }
    }

    fn is_callable(&self, value: &FakeValue) -> bool {
        matches!(value, FakeValue::Function(_))
    }

    fn named_global(&self, name: &str) -> Option<FakeValue> {
        self.globals.lock().get(name).cloned()
    }

    fn install_global_modules(&self, scope: &Arc<Scope<Self>>, modules: &[GlobalModule<Self>]) {
        for module in modules {
            for (function_name, callback) in module.functions() {
                let qualified = format!("{}.{}", module.name(), function_name);
                match scope.expose_function(self, &qualified, callback.clone()) {
                    Ok(value) => self.set_global(&qualified, value),
                    Err(e) => tracing::warn!("[fake] Failed to install {}: {}", qualified, e),
                }
            }
        }
    }

    fn create_function(&self, data: Arc<FunctionData<Self>>) -> Result<FakeValue, ScriptError> {
        Ok(FakeValue::Function(Arc::new(
            move |context: &FakeContext, args: &[FakeValue]| data.invoke(context, args),
        )))
    }

    fn string_value(&self, value: &FakeValue) -> Option<String> {
        match value {
            FakeValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn undefined(&self) -> FakeValue {
        FakeValue::Undefined
    }
}

/// Install a test subscriber honouring `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine whose contexts share `journal`.
pub(crate) fn fake_engine(thread_name: &str, journal: Journal) -> Arc<ThreadedEngine<FakeContext>> {
    let config = EngineConfig {
        thread_name: thread_name.to_string(),
    };
    ThreadedEngine::spawn(&config, move || Some(FakeContext::with_journal(journal.clone())))
        .expect("spawn engine thread")
}

/// Uninitialized scope on its own engine, with a callable bootstrap.
pub(crate) fn fake_scope(
    name: &str,
) -> (Arc<Scope<FakeContext>>, Arc<ThreadedEngine<FakeContext>>) {
    let engine = fake_engine(name, Journal::default());
    let scope = scope_on(engine.clone(), name, HookTable::new(), "bootstrap");
    (scope, engine)
}

/// Uninitialized scope on its own engine whose bootstrap resource is `bootstrap`.
pub(crate) fn scope_with(
    name: &str,
    journal: Journal,
    hooks: HookTable<FakeContext>,
    bootstrap: &'static str,
) -> Arc<Scope<FakeContext>> {
    scope_on(fake_engine(name, journal), name, hooks, bootstrap)
}

/// Uninitialized scope on `engine` whose bootstrap resource is `bootstrap`.
pub(crate) fn scope_on(
    engine: Arc<ThreadedEngine<FakeContext>>,
    name: &str,
    hooks: HookTable<FakeContext>,
    bootstrap: &'static str,
) -> Arc<Scope<FakeContext>> {
    let resources = EmbeddedResources::new().with("bootstrap.js", bootstrap);
    Scope::builder(engine)
        .name(name)
        .hooks(hooks)
        .resources(Arc::new(resources))
        .build()
}

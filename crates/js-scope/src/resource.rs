//! Embedded script resources.

use std::collections::HashMap;

use crate::context::ScriptSource;

/// Source of embedded scripts, such as the bootstrap.
pub trait ResourceLoader: Send + Sync {
    /// Source registered under `name`, if any.
    fn embedded_source(&self, name: &str) -> Option<ScriptSource>;
}

/// In-memory resource table of `'static` sources, typically filled with
/// `include_str!` output.
#[derive(Debug, Default, Clone)]
pub struct EmbeddedResources {
    sources: HashMap<String, &'static str>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: &'static str) {
        self.sources.insert(name.into(), source);
    }

    pub fn with(mut self, name: impl Into<String>, source: &'static str) -> Self {
        self.insert(name, source);
        self
    }
}

impl ResourceLoader for EmbeddedResources {
    fn embedded_source(&self, name: &str) -> Option<ScriptSource> {
        self.sources
            .get(name)
            .map(|source| ScriptSource::from_static(source))
    }
}

//! Ordered registry of framework adapters.

use std::fmt;
use std::sync::Arc;

use crate::framework::Framework;

/// Named framework adapters, consulted in registration order.
///
/// Registering a name that already exists replaces that entry in place, so
/// it keeps its priority. To place user adapters ahead of a default set,
/// register them first and [`merge`](Frameworks::merge) the defaults.
#[derive(Clone, Default)]
pub struct Frameworks {
    entries: Vec<(String, Arc<dyn Framework>)>,
}

impl Frameworks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framework under a name.
    pub fn register(&mut self, name: impl Into<String>, framework: impl Framework + 'static) {
        self.register_shared(name, Arc::new(framework));
    }

    /// Register an already shared framework under a name.
    pub fn register_shared(&mut self, name: impl Into<String>, framework: Arc<dyn Framework>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = framework,
            None => self.entries.push((name, framework)),
        }
    }

    /// Builder form of [`register`](Frameworks::register).
    pub fn with(mut self, name: impl Into<String>, framework: impl Framework + 'static) -> Self {
        self.register(name, framework);
        self
    }

    /// Append every entry of `fallback` whose name is not registered yet.
    pub fn merge(mut self, fallback: &Frameworks) -> Self {
        for (name, framework) in &fallback.entries {
            if !self.contains(name) {
                self.entries.push((name.clone(), Arc::clone(framework)));
            }
        }
        self
    }

    /// Look up a framework by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Framework>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, framework)| framework)
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, in priority order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Registered entries, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Framework>)> {
        self.entries
            .iter()
            .map(|(name, framework)| (name.as_str(), framework))
    }

    /// Number of registered frameworks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no framework is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Frameworks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

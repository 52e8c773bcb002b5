//! The table of loaded modules, keyed by fully qualified dotted name.
//!
//! This is the model's `sys.modules`. Lookups consult it before any finder
//! runs, mock modules register themselves into it, and the prober diffs its
//! key set to undo everything an import attempt added. It is an explicit
//! handle threaded through whoever needs it rather than process-global
//! state.

use crate::module::ModuleObject;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<ModuleObject>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModuleObject>> {
        self.modules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Stores `module` under its own name and returns the stored handle.
    /// An existing entry under the same name is replaced.
    pub fn insert(&mut self, module: Arc<ModuleObject>) -> Arc<ModuleObject> {
        self.modules
            .insert(module.name().to_string(), Arc::clone(&module));
        module
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<ModuleObject>> {
        self.modules.remove(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The current key set, to diff against later.
    pub fn snapshot(&self) -> HashSet<String> {
        self.modules.keys().cloned().collect()
    }

    /// Names present now that are absent from `snapshot`, sorted for
    /// deterministic reporting.
    pub fn added_since(&self, snapshot: &HashSet<String>) -> Vec<String> {
        let mut added: Vec<String> = self
            .modules
            .keys()
            .filter(|name| !snapshot.contains(*name))
            .cloned()
            .collect();
        added.sort();
        added
    }

    /// Removes every entry added since `snapshot` and returns the evicted
    /// names. Entries that were present at snapshot time are left alone,
    /// whatever happened to them in between.
    pub fn evict_added_since(&mut self, snapshot: &HashSet<String>) -> Vec<String> {
        let added = self.added_since(snapshot);
        for name in &added {
            self.modules.remove(name);
        }
        added
    }
}

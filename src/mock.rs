//! Mock modules: registry-backed stand-ins for modules that do not exist.
//!
//! A mock module registers itself under its fully qualified name at
//! construction time, so every later lookup of that name lands on the same
//! object. Attribute access hands out child mock modules, which register
//! themselves the same way; that is what lets `from missing import name`
//! and `import missing.sub.deeper` keep resolving once `missing` has been
//! substituted.

use crate::error::AttributeError;
use crate::module::{ModuleObject, ModuleSpec};
use crate::registry::ModuleRegistry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Handle to a mock module in the registry.
///
/// Handles are cheap clones of the same underlying object; identity follows
/// the registry entry, not the handle.
#[derive(Debug, Clone)]
pub struct MockModule {
    inner: Arc<ModuleObject>,
}

impl MockModule {
    /// Registers a mock module and returns its handle. `prefix` is the
    /// dotted parent path, empty for a root; `name` itself may be dotted
    /// when a whole failing prefix is substituted at once.
    pub fn register(registry: &mut ModuleRegistry, name: &str, prefix: &str) -> MockModule {
        let fullname = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let module = Arc::new(ModuleObject::new(ModuleSpec::mock(&fullname)));
        let stored = registry.insert(module);
        trace!(module = %fullname, "registered mock module");
        MockModule { inner: stored }
    }

    /// Wraps an existing module object, if it is a mock.
    pub fn from_object(module: Arc<ModuleObject>) -> Option<MockModule> {
        if module.is_mock() {
            Some(MockModule { inner: module })
        } else {
            None
        }
    }

    /// Fully qualified name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn object(&self) -> &Arc<ModuleObject> {
        &self.inner
    }

    /// Attribute access.
    ///
    /// Underscore-prefixed names are refused before anything is recorded,
    /// so dunder probes from introspection machinery do not spawn children.
    /// Any other name is logged and answered with the child mock module
    /// `self.name + "." + name`, reusing the registered child when one
    /// exists.
    pub fn attr(
        &self,
        registry: &mut ModuleRegistry,
        name: &str,
    ) -> Result<MockModule, AttributeError> {
        if name.starts_with('_') {
            return Err(AttributeError {
                module: self.name().to_string(),
                name: name.to_string(),
            });
        }
        self.inner.record_access(name);
        let fullname = format!("{}.{}", self.name(), name);
        if let Some(existing) = registry.get(&fullname) {
            if let Some(child) = MockModule::from_object(existing) {
                return Ok(child);
            }
        }
        Ok(MockModule::register(registry, name, self.name()))
    }

    /// Records an attribute write. The value is irrelevant to dependency
    /// discovery; only the touched name is kept.
    pub fn set_attr(&self, name: &str) {
        self.inner.record_access(name);
    }

    /// Attribute names handed out or written so far, in order.
    pub fn accessed(&self) -> Vec<String> {
        self.inner.accessed()
    }

    /// The value of calling the module object. Stable across calls.
    pub fn call(&self) -> MockValue {
        self.inner.stand_in().call()
    }

    /// The value of indexing the module object. Stable per key.
    pub fn index(&self, key: &str) -> MockValue {
        self.inner.stand_in().index(key)
    }
}

impl fmt::Display for MockModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MockModule '{}'>", self.name())
    }
}

/// Loader protocol for mock modules.
///
/// Mock modules register at construction time, so creation is a registry
/// lookup rather than a build, and execution does nothing; the module's
/// behavior lives entirely in its attribute protocol.
pub struct MockLoader;

impl MockLoader {
    /// The registered instance for `spec`, if any.
    pub fn create(registry: &ModuleRegistry, spec: &ModuleSpec) -> Option<Arc<ModuleObject>> {
        registry.get(spec.name())
    }

    /// Executing a mock module is a no-op.
    pub fn exec() {}
}

/// An inert value produced by using a mock module in expression position.
///
/// Calling, indexing, or dereferencing an attribute yields another cached
/// `MockValue`, so chained expressions never fail and the same path always
/// yields the identical value.
#[derive(Debug, Clone)]
pub struct MockValue {
    inner: Arc<MockValueState>,
}

#[derive(Debug)]
struct MockValueState {
    repr: String,
    children: RwLock<HashMap<String, MockValue>>,
}

impl MockValue {
    pub(crate) fn new(repr: String) -> MockValue {
        MockValue {
            inner: Arc::new(MockValueState {
                repr,
                children: RwLock::new(HashMap::new()),
            }),
        }
    }

    fn child(&self, key: &str, repr: String) -> MockValue {
        let mut children = self.inner.children.write().unwrap();
        children
            .entry(key.to_string())
            .or_insert_with(|| MockValue::new(repr))
            .clone()
    }

    pub fn call(&self) -> MockValue {
        self.child("()", format!("{}()", self.inner.repr))
    }

    pub fn index(&self, key: &str) -> MockValue {
        self.child(&format!("[{key}]"), format!("{}[{key}]", self.inner.repr))
    }

    pub fn attr(&self, name: &str) -> MockValue {
        self.child(&format!(".{name}"), format!("{}.{name}", self.inner.repr))
    }

    /// Object identity, the analogue of `is`.
    pub fn is(&self, other: &MockValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for MockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MockValue '{}'>", self.inner.repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_inserts_under_the_full_name() {
        let mut registry = ModuleRegistry::new();
        let root = MockModule::register(&mut registry, "fake_pkg", "");
        assert_eq!(root.name(), "fake_pkg");
        assert!(registry.contains("fake_pkg"));

        let nested = MockModule::register(&mut registry, "sub", "fake_pkg");
        assert_eq!(nested.name(), "fake_pkg.sub");
        assert!(registry.contains("fake_pkg.sub"));
    }

    #[test]
    fn dotted_name_registers_as_given() {
        let mut registry = ModuleRegistry::new();
        let module = MockModule::register(&mut registry, "a.b.c", "");
        assert_eq!(module.name(), "a.b.c");
        assert!(registry.contains("a.b.c"));
    }

    #[test]
    fn attr_spawns_and_reuses_children() {
        let mut registry = ModuleRegistry::new();
        let root = MockModule::register(&mut registry, "fake", "");

        let first = root.attr(&mut registry, "child").unwrap();
        assert_eq!(first.name(), "fake.child");
        assert!(registry.contains("fake.child"));

        let second = root.attr(&mut registry, "child").unwrap();
        assert!(
            Arc::ptr_eq(first.object(), second.object()),
            "repeated access must yield the identical module"
        );
    }

    #[test]
    fn attr_refuses_underscore_names_without_logging() {
        let mut registry = ModuleRegistry::new();
        let root = MockModule::register(&mut registry, "fake", "");
        let err = root.attr(&mut registry, "__spec__").unwrap_err();
        assert_eq!(err.name, "__spec__");
        assert!(!registry.contains("fake.__spec__"));
        assert!(root.accessed().is_empty());
    }

    #[test]
    fn access_log_keeps_discovery_order() {
        let mut registry = ModuleRegistry::new();
        let root = MockModule::register(&mut registry, "fake", "");
        root.attr(&mut registry, "b").unwrap();
        root.attr(&mut registry, "a").unwrap();
        root.set_attr("written");
        assert_eq!(root.accessed(), vec!["b", "a", "written"]);
    }

    #[test]
    fn from_object_rejects_real_modules() {
        let mut registry = ModuleRegistry::new();
        registry.insert(Arc::new(ModuleObject::new(ModuleSpec::installed("os"))));
        let fetched = registry.get("os").unwrap();
        assert!(MockModule::from_object(fetched).is_none());
    }

    #[test]
    fn loader_create_returns_the_registered_instance() {
        let mut registry = ModuleRegistry::new();
        let module = MockModule::register(&mut registry, "fake", "");
        let created = MockLoader::create(&registry, module.object().spec()).unwrap();
        assert!(Arc::ptr_eq(&created, module.object()));
        MockLoader::exec();
    }

    #[test]
    fn display_renders_the_qualified_name() {
        let mut registry = ModuleRegistry::new();
        let module = MockModule::register(&mut registry, "sub", "fake");
        assert_eq!(module.to_string(), "<MockModule 'fake.sub'>");
    }

    #[test]
    fn calls_and_indexing_yield_stable_values() {
        let mut registry = ModuleRegistry::new();
        let module = MockModule::register(&mut registry, "fake", "");

        let once = module.call();
        let twice = module.call();
        assert!(once.is(&twice));

        let item = module.index("key");
        assert!(item.is(&module.index("key")));
        assert!(!item.is(&module.index("other")));

        let chained = once.attr("method").call();
        assert!(chained.is(&once.attr("method").call()));
        assert_eq!(chained.to_string(), "<MockValue 'fake().method()'>");
    }
}

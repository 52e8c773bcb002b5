//! The finder chain: how a dotted name becomes an import spec.
//!
//! Finders are consulted in order after the registry itself has missed.
//! [`MockFinder`] sits at the front once a probe installs it, so children of
//! substituted modules resolve before any real lookup; [`SourceFinder`]
//! resolves files under the environment roots the way `sys.path` entries
//! would; [`InstalledFinder`] answers for anything whose top-level name the
//! environment declares installed.

use crate::environment::{locate_in, Environment, SourceLocation};
use crate::mock::MockModule;
use crate::module::ModuleSpec;
use crate::name::ModuleName;
use crate::registry::ModuleRegistry;

/// Given a dotted name, either produce an import spec or report a miss so
/// the next finder in the chain can try.
pub trait MetaPathFinder {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    fn find_spec(
        &self,
        target: &ModuleName,
        registry: &mut ModuleRegistry,
        env: &Environment,
    ) -> Option<ModuleSpec>;
}

/// Resolves children of registered mock modules.
///
/// A dotted name whose parent prefix is a registered mock resolves by asking
/// the parent for its leaf attribute. The answering child registers itself
/// as a side effect, which is exactly what the follow-up create step relies
/// on. Top-level names are never answered here; a root mock is found by the
/// registry-first lookup before any finder runs.
pub struct MockFinder;

impl MetaPathFinder for MockFinder {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn find_spec(
        &self,
        target: &ModuleName,
        registry: &mut ModuleRegistry,
        _env: &Environment,
    ) -> Option<ModuleSpec> {
        let parent = target.parent()?;
        let parent_module = registry.get(&parent.dotted())?;
        let mock = MockModule::from_object(parent_module)?;
        // An underscore leaf is refused by the attribute protocol; treat it
        // as a miss rather than a failure.
        let child = mock.attr(registry, target.leaf()).ok()?;
        Some(child.object().spec().clone())
    }
}

/// Resolves source files: top-level names against the environment roots in
/// order, dotted names against the parent package's search locations.
pub struct SourceFinder;

impl MetaPathFinder for SourceFinder {
    fn name(&self) -> &'static str {
        "source"
    }

    fn find_spec(
        &self,
        target: &ModuleName,
        registry: &mut ModuleRegistry,
        env: &Environment,
    ) -> Option<ModuleSpec> {
        let location = match target.parent() {
            None => env.locate_top_level(target.head())?,
            Some(parent) => {
                let parent_module = registry.get(&parent.dotted())?;
                locate_under(parent_module.spec().search_locations(), target.leaf())?
            }
        };
        let SourceLocation { path, is_package } = location;
        Some(ModuleSpec::source(&target.dotted(), path, is_package))
    }
}

fn locate_under(dirs: &[std::path::PathBuf], leaf: &str) -> Option<SourceLocation> {
    dirs.iter().find_map(|dir| locate_in(dir, leaf))
}

/// Resolves names whose top-level head the environment declares installed.
/// Installed packages are opaque, so any depth beneath them resolves too.
pub struct InstalledFinder;

impl MetaPathFinder for InstalledFinder {
    fn name(&self) -> &'static str {
        "installed"
    }

    fn find_spec(
        &self,
        target: &ModuleName,
        _registry: &mut ModuleRegistry,
        env: &Environment,
    ) -> Option<ModuleSpec> {
        if env.is_installed(target.head()) {
            Some(ModuleSpec::installed(&target.dotted()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleObject, ModuleOrigin};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn name(s: &str) -> ModuleName {
        ModuleName::parse(s).unwrap()
    }

    #[test]
    fn mock_finder_ignores_top_level_names() {
        let mut registry = ModuleRegistry::new();
        MockModule::register(&mut registry, "fake", "");
        let env = Environment::empty();
        assert!(MockFinder
            .find_spec(&name("fake"), &mut registry, &env)
            .is_none());
    }

    #[test]
    fn mock_finder_spawns_children_of_mock_parents() {
        let mut registry = ModuleRegistry::new();
        MockModule::register(&mut registry, "fake", "");
        let env = Environment::empty();

        let spec = MockFinder
            .find_spec(&name("fake.sub"), &mut registry, &env)
            .unwrap();
        assert_eq!(spec.name(), "fake.sub");
        assert_eq!(spec.origin(), &ModuleOrigin::Mock);
        // The child registered itself while being found.
        assert!(registry.contains("fake.sub"));
    }

    #[test]
    fn mock_finder_misses_underscore_leaves_and_real_parents() {
        let mut registry = ModuleRegistry::new();
        MockModule::register(&mut registry, "fake", "");
        registry.insert(Arc::new(ModuleObject::new(ModuleSpec::installed("os"))));
        let env = Environment::empty();

        assert!(MockFinder
            .find_spec(&name("fake._private"), &mut registry, &env)
            .is_none());
        assert!(MockFinder
            .find_spec(&name("os.path"), &mut registry, &env)
            .is_none());
    }

    #[test]
    fn installed_finder_answers_any_depth_under_an_installed_head() {
        let mut registry = ModuleRegistry::new();
        let env = Environment::default();

        let spec = InstalledFinder
            .find_spec(&name("os.path"), &mut registry, &env)
            .unwrap();
        assert_eq!(spec.name(), "os.path");
        assert_eq!(spec.origin(), &ModuleOrigin::Installed);
        assert!(InstalledFinder
            .find_spec(&name("pandas"), &mut registry, &env)
            .is_none());
    }

    #[test]
    fn source_finder_resolves_top_level_files_from_roots() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("single.py"), "x = 1\n").unwrap();
        let mut registry = ModuleRegistry::new();
        let env = Environment::empty().with_root(dir.path());

        let spec = SourceFinder
            .find_spec(&name("single"), &mut registry, &env)
            .unwrap();
        assert_eq!(spec.name(), "single");
        assert!(!spec.is_package());
    }

    #[test]
    fn source_finder_resolves_submodules_through_the_parent_package() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(dir.path().join("pkg/sub.py"), "y = 2\n").unwrap();

        let mut registry = ModuleRegistry::new();
        let env = Environment::empty().with_root(dir.path());

        let parent_spec = SourceFinder
            .find_spec(&name("pkg"), &mut registry, &env)
            .unwrap();
        assert!(parent_spec.is_package());
        registry.insert(Arc::new(ModuleObject::new(parent_spec)));

        let sub_spec = SourceFinder
            .find_spec(&name("pkg.sub"), &mut registry, &env)
            .unwrap();
        assert_eq!(sub_spec.name(), "pkg.sub");
        assert!(!sub_spec.is_package());
    }

    #[test]
    fn source_finder_needs_a_registered_parent_for_submodules() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(dir.path().join("pkg/sub.py"), "").unwrap();

        let mut registry = ModuleRegistry::new();
        let env = Environment::empty().with_root(dir.path());

        assert!(SourceFinder
            .find_spec(&name("pkg.sub"), &mut registry, &env)
            .is_none());
    }
}

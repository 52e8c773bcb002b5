//! The model import machinery.
//!
//! [`Importer`] ties the pieces together: registry-first lookup, the finder
//! chain, and the create/register/execute cycle for source modules. Two
//! details carry the whole prober design. Modules enter the registry before
//! their body runs, so import cycles terminate and a registered mock
//! short-circuits every later lookup of its name. And a module whose body
//! fails is evicted again, so the next attempt re-executes it from the top
//! instead of trusting a half-built entry.

use crate::environment::Environment;
use crate::error::{ImportError, Result};
use crate::finder::{InstalledFinder, MetaPathFinder, MockFinder, SourceFinder};
use crate::mock::{MockLoader, MockModule};
use crate::module::{ModuleObject, ModuleOrigin, ModuleSpec};
use crate::name::{self, ModuleName};
use crate::registry::ModuleRegistry;
use crate::source::{parse_source, Directive, FromNames, SourceModule};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

pub struct Importer {
    registry: ModuleRegistry,
    env: Environment,
    finders: Vec<Box<dyn MetaPathFinder>>,
    /// Parse results memoized by file path. Survives registry eviction, so
    /// a retried import does not re-read or re-parse anything.
    parsed: HashMap<PathBuf, Arc<SourceModule>>,
}

impl Importer {
    /// An importer over `env` with the source and installed finders in
    /// place.
    pub fn new(env: Environment) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            env,
            finders: vec![Box::new(SourceFinder), Box::new(InstalledFinder)],
            parsed: HashMap::new(),
        }
    }

    /// Puts the mock finder at the front of the chain, so mock children win
    /// over any real lookup. Calling this again is a no-op.
    pub fn install_mock_finder(&mut self) {
        if self.finders.iter().any(|finder| finder.name() == "mock") {
            return;
        }
        self.finders.insert(0, Box::new(MockFinder));
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Imports `name` resolved against `package` and returns the module the
    /// full dotted name refers to. The counterpart of
    /// `importlib.import_module`.
    pub fn import(&mut self, name: &str, package: &str) -> Result<Arc<ModuleObject>> {
        let target = name::resolve_name(name, package)?;
        self.import_absolute(&target)
    }

    /// Imports an absolute dotted name, loading every prefix in order. The
    /// first prefix that fails names the failure.
    pub fn import_absolute(&mut self, target: &ModuleName) -> Result<Arc<ModuleObject>> {
        let mut imported = None;
        for prefix in target.prefixes() {
            imported = Some(self.ensure(&prefix)?);
        }
        imported.ok_or_else(|| ImportError::InvalidName {
            name: target.dotted(),
        })
    }

    /// Returns the registered module for exactly `target`, loading it if
    /// needed. A failure names `target` itself.
    fn ensure(&mut self, target: &ModuleName) -> Result<Arc<ModuleObject>> {
        let key = target.dotted();
        if let Some(module) = self.registry.get(&key) {
            return Ok(module);
        }
        let Some(spec) = self.find_spec(target) else {
            return Err(ImportError::ModuleNotFound { name: key });
        };
        trace!(module = %key, origin = ?spec.origin(), "module resolved");
        self.load(spec)
    }

    fn find_spec(&mut self, target: &ModuleName) -> Option<ModuleSpec> {
        for finder in &self.finders {
            if let Some(spec) = finder.find_spec(target, &mut self.registry, &self.env) {
                return Some(spec);
            }
        }
        None
    }

    fn load(&mut self, spec: ModuleSpec) -> Result<Arc<ModuleObject>> {
        match spec.origin().clone() {
            ModuleOrigin::Mock => {
                // Mock modules register at construction; creation through
                // their loader is a lookup of what the finder just spawned.
                if let Some(module) = MockLoader::create(&self.registry, &spec) {
                    MockLoader::exec();
                    return Ok(module);
                }
                let module = MockModule::register(&mut self.registry, spec.name(), "");
                Ok(Arc::clone(module.object()))
            }
            ModuleOrigin::Installed => {
                // Installed modules are opaque; nothing to execute.
                let module = Arc::new(ModuleObject::new(spec));
                Ok(self.registry.insert(module))
            }
            ModuleOrigin::Source(path) => {
                let key = spec.name().to_string();
                let parsed = self.parsed_source(&key, &path)?;
                let module = Arc::new(ModuleObject::with_bound(spec, parsed.bound.clone()));
                let module = self.registry.insert(module);
                if let Err(err) = self.exec_directives(&parsed.directives, &module) {
                    self.registry.remove(&key);
                    return Err(err);
                }
                Ok(module)
            }
        }
    }

    fn parsed_source(&mut self, name: &str, path: &Path) -> Result<Arc<SourceModule>> {
        if let Some(parsed) = self.parsed.get(path) {
            return Ok(Arc::clone(parsed));
        }
        let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = Arc::new(parse_source(name, path, &text)?);
        self.parsed.insert(path.to_path_buf(), Arc::clone(&parsed));
        Ok(parsed)
    }

    fn exec_directives(
        &mut self,
        directives: &[Directive],
        current: &Arc<ModuleObject>,
    ) -> Result<()> {
        for directive in directives {
            self.exec_directive(directive, current)?;
        }
        Ok(())
    }

    fn exec_directive(&mut self, directive: &Directive, current: &Arc<ModuleObject>) -> Result<()> {
        match directive {
            Directive::Import { module, line } => {
                trace!(module = %module, line = *line, "import directive");
                let target = ModuleName::parse(module)?;
                self.import_absolute(&target)?;
                Ok(())
            }
            Directive::From {
                level,
                module,
                names,
                line,
            } => {
                trace!(level = *level, module = ?module, line = *line, "from-import directive");
                let target =
                    name::resolve_from(*level, module.as_deref(), current.anchor_package())?;
                let parent = self.import_absolute(&target)?;
                match names {
                    FromNames::Star => Ok(()),
                    FromNames::Names(list) => {
                        for n in list {
                            self.bind_from(current, &parent, &target, n)?;
                        }
                        Ok(())
                    }
                }
            }
            Directive::Try {
                body,
                catches_import_error,
                handlers,
                orelse,
                finalbody,
            } => {
                let outcome = match self.exec_directives(body, current) {
                    Ok(()) => self.exec_directives(orelse, current),
                    Err(ImportError::ModuleNotFound { name }) if *catches_import_error => {
                        trace!(module = %name, "optional import failed, handler takes over");
                        self.exec_directives(handlers, current)
                    }
                    Err(err) => Err(err),
                };
                // The final body runs on every path; its own failure
                // replaces a pending one.
                self.exec_directives(finalbody, current)?;
                outcome
            }
        }
    }

    /// Resolves one name of `from <parent> import <n>`.
    ///
    /// An attribute bound by the parent wins, unless the directive sits in
    /// the parent's own body. Packages then get a submodule import attempt,
    /// plain modules a registry lookup of the dotted name, and a name still
    /// missing after that is reported in its dotted submodule form so the
    /// parent's own registry entry stays untouched.
    fn bind_from(
        &mut self,
        current: &Arc<ModuleObject>,
        parent: &Arc<ModuleObject>,
        parent_name: &ModuleName,
        n: &str,
    ) -> Result<()> {
        match parent.origin() {
            ModuleOrigin::Installed => Ok(()),
            ModuleOrigin::Mock => {
                if let Some(mock) = MockModule::from_object(Arc::clone(parent)) {
                    if mock.attr(&mut self.registry, n).is_ok() {
                        return Ok(());
                    }
                }
                // Underscore names fall through to an ordinary submodule
                // attempt, which fails under the dotted name.
                self.import_absolute(&parent_name.child(n)).map(|_| ())
            }
            ModuleOrigin::Source(_) => {
                // A from-import inside the parent's own body runs before
                // that body's bindings exist, so the binding check cannot
                // settle it there.
                let self_import = Arc::ptr_eq(current, parent);
                if !self_import && parent.binds(n) {
                    return Ok(());
                }
                let child = parent_name.child(n);
                if parent.is_package() {
                    match self.import_absolute(&child) {
                        Ok(_) => return Ok(()),
                        // Only the absence of the submodule itself falls
                        // through; a failure inside its body propagates.
                        Err(ImportError::ModuleNotFound { name })
                            if name == child.dotted() => {}
                        Err(err) => return Err(err),
                    }
                } else if self.registry.contains(&child.dotted()) {
                    // A plain module has no submodules to probe, but a
                    // stand-in registered under the dotted name by an
                    // earlier attempt still settles the binding.
                    return Ok(());
                }
                Err(ImportError::ModuleNotFound {
                    name: child.dotted(),
                })
            }
        }
    }
}

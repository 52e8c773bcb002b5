//! Module objects and their import-time metadata.
//!
//! One [`ModuleObject`] shape covers all three origins the machinery deals
//! with. Source modules carry the set of top-level names their body binds,
//! mock modules carry the attribute access log and the cached stand-in
//! value, installed modules are opaque.

use crate::mock::MockValue;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

/// Where a module's definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// A `.py` file under one of the environment's search roots.
    Source(PathBuf),
    /// Declared installed by the environment. Treated as attribute-complete,
    /// so any attribute or submodule of it resolves.
    Installed,
    /// Fabricated stand-in for a module that does not exist.
    Mock,
}

/// Import-time metadata for a module, produced by a finder.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    name: String,
    origin: ModuleOrigin,
    is_package: bool,
    /// Directories searched for submodules. Non-empty only for source
    /// packages; mock modules advertise a package shape with no locations.
    search_locations: Vec<PathBuf>,
}

impl ModuleSpec {
    /// Spec for a file-backed module. A package's submodules are searched
    /// next to its `__init__.py`.
    pub fn source(name: &str, path: PathBuf, is_package: bool) -> Self {
        let search_locations = if is_package {
            path.parent().map(|dir| dir.to_path_buf()).into_iter().collect()
        } else {
            Vec::new()
        };
        Self {
            name: name.to_string(),
            origin: ModuleOrigin::Source(path),
            is_package,
            search_locations,
        }
    }

    /// Spec for an installed module. Marked as a package so dotted names
    /// beneath it keep resolving.
    pub fn installed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: ModuleOrigin::Installed,
            is_package: true,
            search_locations: Vec::new(),
        }
    }

    /// Spec for a mock module: package-shaped, no search locations, so the
    /// import system accepts submodules beneath it without touching disk.
    pub fn mock(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: ModuleOrigin::Mock,
            is_package: true,
            search_locations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    pub fn is_package(&self) -> bool {
        self.is_package
    }

    pub fn search_locations(&self) -> &[PathBuf] {
        &self.search_locations
    }
}

/// A loaded module in the registry.
#[derive(Debug)]
pub struct ModuleObject {
    spec: ModuleSpec,
    /// Top-level names the module body binds. Only meaningful for source
    /// modules.
    bound: HashSet<String>,
    /// Attribute names handed out by a mock module, in access order.
    accessed: RwLock<Vec<String>>,
    /// Cached inert value a mock module turns into in expression position.
    stand_in: OnceLock<MockValue>,
}

impl ModuleObject {
    pub fn new(spec: ModuleSpec) -> Self {
        Self::with_bound(spec, HashSet::new())
    }

    pub fn with_bound(spec: ModuleSpec, bound: HashSet<String>) -> Self {
        Self {
            spec,
            bound,
            accessed: RwLock::new(Vec::new()),
            stand_in: OnceLock::new(),
        }
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn origin(&self) -> &ModuleOrigin {
        self.spec.origin()
    }

    pub fn is_package(&self) -> bool {
        self.spec.is_package()
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.spec.origin(), ModuleOrigin::Mock)
    }

    /// Whether the module's body binds `name` at top level. Installed
    /// modules bind everything; mock modules answer through their own
    /// attribute protocol instead.
    pub fn binds(&self, name: &str) -> bool {
        match self.spec.origin() {
            ModuleOrigin::Installed => true,
            ModuleOrigin::Source(_) => self.bound.contains(name),
            ModuleOrigin::Mock => false,
        }
    }

    /// The anchor package for relative imports executed by this module.
    /// A package anchors at itself, a plain module at its parent, and a
    /// top-level plain module has no anchor.
    pub fn anchor_package(&self) -> &str {
        if self.spec.is_package() {
            self.name()
        } else {
            self.name().rsplit_once('.').map(|(parent, _)| parent).unwrap_or("")
        }
    }

    pub(crate) fn record_access(&self, name: &str) {
        self.accessed.write().unwrap().push(name.to_string());
    }

    /// Attribute names accessed so far, in order. Mock bookkeeping.
    pub fn accessed(&self) -> Vec<String> {
        self.accessed.read().unwrap().clone()
    }

    pub(crate) fn stand_in(&self) -> &MockValue {
        self.stand_in
            .get_or_init(|| MockValue::new(self.name().to_string()))
    }
}

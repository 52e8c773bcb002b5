//! The import prober: discovery of missing transitive dependencies.
//!
//! A probe keeps attempting the requested import. Every attempt either
//! succeeds or names exactly one missing module; that module gets a mock
//! registered under it, the name is recorded, and the import is retried.
//! Once an attempt runs to completion the recorded names are the answer.

use crate::environment::Environment;
use crate::error::{ImportError, Result};
use crate::machinery::Importer;
use crate::mock::MockModule;
use tracing::debug;

/// Discovers every transitive import dependency of a module that the
/// environment cannot satisfy.
///
/// A `Prober` owns its importer and registry, and `find_imports` takes
/// `&mut self`: probes are strictly sequential, never reentrant. Each call
/// leaves the registry exactly as it found it.
pub struct Prober {
    importer: Importer,
}

impl Prober {
    /// A prober over `env`. The mock finder is installed once, at the front
    /// of the importer's finder chain.
    pub fn new(env: Environment) -> Self {
        let mut importer = Importer::new(env);
        importer.install_mock_finder();
        Self { importer }
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    /// Returns the names of all modules the import of `module_name`
    /// (resolved against `package_name`, which may be empty) required but
    /// the environment could not provide, in the order the failures
    /// surfaced.
    ///
    /// Whatever the outcome, every registry entry the attempt added is
    /// removed again before returning, mocks and genuinely imported modules
    /// alike. A non-recoverable failure is returned as the error after that
    /// cleanup.
    pub fn find_imports(&mut self, module_name: &str, package_name: &str) -> Result<Vec<String>> {
        let snapshot = self.importer.registry().snapshot();
        let mut missing = Vec::new();
        let outcome = self.run(module_name, package_name, &mut missing);
        let evicted = self.importer.registry_mut().evict_added_since(&snapshot);
        debug!(
            module = module_name,
            evicted = evicted.len(),
            "probe cleanup"
        );
        outcome?;
        debug!(module = module_name, missing = ?missing, "probe finished");
        Ok(missing)
    }

    fn run(
        &mut self,
        module_name: &str,
        package_name: &str,
        missing: &mut Vec<String>,
    ) -> Result<()> {
        loop {
            match self.importer.import(module_name, package_name) {
                Ok(_) => return Ok(()),
                Err(ImportError::ModuleNotFound { name }) => {
                    debug!(module = %name, "missing module, substituting a mock");
                    MockModule::register(self.importer.registry_mut(), &name, "");
                    missing.push(name);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// One-shot probe against the default environment.
pub fn find_imports(module_name: &str, package_name: &str) -> Result<Vec<String>> {
    Prober::new(Environment::default()).find_imports(module_name, package_name)
}

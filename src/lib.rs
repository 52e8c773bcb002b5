// Lib file to expose modules for testing and external usage.
// This file serves as the root for the library crate.

/// Module containing the import prober.
/// This includes the `Prober` struct and the `find_imports` entry point.
pub mod prober;

/// Module containing the import machinery.
/// This includes the `Importer` and the load/execute pipeline behind it.
pub mod machinery;

/// Module defining the meta path finders.
/// Finders map a module name to a spec; the importer consults them in order.
pub mod finder;

/// Module containing mock modules and values.
/// These stand in for anything the environment cannot provide.
pub mod mock;

/// Module defining the environment description.
/// This covers source roots and the set of installed module names.
pub mod environment;

/// Module containing the static source reader.
/// This parses Python files and extracts their import directives.
pub mod source;

/// Module defining module objects, specs, and origins.
pub mod module;

/// Module containing the module registry, keyed by fully qualified name.
pub mod registry;

/// Module containing dotted-name parsing and relative-import resolution.
pub mod name;

/// Module defining the error types.
pub mod error;

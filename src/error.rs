//! Error types for the import machinery.
//!
//! [`ImportError`] carries every way an import attempt can fail. Exactly one
//! variant is recoverable: `ModuleNotFound`, which the prober answers by
//! registering a mock module under the missing name and retrying. Every other
//! variant aborts the probe and surfaces to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Failure classes of an import attempt.
#[derive(Debug, Error)]
pub enum ImportError {
    /// No finder knows the named module. Carries the exact dotted name whose
    /// resolution failed, which may be a parent prefix of the requested name
    /// (importing `a.b.c` fails as `a` if `a` itself is missing).
    #[error("no module named '{name}'")]
    ModuleNotFound { name: String },

    /// The requested name is not a well-formed dotted identifier.
    #[error("invalid module name '{name}'")]
    InvalidName { name: String },

    /// A relative name was given without an anchor package to resolve
    /// against.
    #[error("attempted relative import '{name}' with no anchor package")]
    RelativeWithoutAnchor { name: String },

    /// A relative import climbed past the top of its anchor package.
    #[error("relative import '{name}' escapes top-level package '{package}'")]
    BeyondTopLevel { name: String, package: String },

    /// A module file was located but its source does not parse.
    #[error("cannot parse '{name}' at {path}: {message}")]
    Parse {
        name: String,
        path: PathBuf,
        message: String,
    },

    /// A module file was located but could not be read.
    #[error("cannot read '{name}' at {path}")]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    /// Whether this failure can be recovered from by substituting a mock.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImportError::ModuleNotFound { .. })
    }
}

/// Attribute lookup failure on a mock module.
///
/// Mock modules refuse underscore-prefixed attributes so that dunder probes
/// from introspection machinery do not spawn an endless tree of children.
/// The condition never escapes the importer; finders translate it into an
/// ordinary miss.
#[derive(Debug, Error)]
#[error("mock module '{module}' has no attribute '{name}'")]
pub struct AttributeError {
    /// Fully qualified name of the module that was probed.
    pub module: String,
    /// The attribute that was refused.
    pub name: String,
}

/// Result type alias for importer operations.
pub type Result<T> = std::result::Result<T, ImportError>;

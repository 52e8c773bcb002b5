//! Dotted module names and relative-import resolution.

use crate::error::ImportError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    /// Shape of an absolute dotted name: identifier segments joined by dots.
    static ref DOTTED_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
}

/// An absolute dotted module name such as `pkg.sub.mod`.
///
/// Segments are kept split so prefix iteration and parent/leaf access do not
/// re-scan the string. The dotted rendering is the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleName {
    segments: Vec<String>,
}

impl ModuleName {
    /// Parses an absolute dotted name. Empty names, empty segments and
    /// non-identifier characters are rejected.
    pub fn parse(name: &str) -> Result<Self, ImportError> {
        if !DOTTED_NAME.is_match(name) {
            return Err(ImportError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(Self {
            segments: name.split('.').map(str::to_string).collect(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The top-level segment.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// The parent prefix, or `None` for a top-level name.
    pub fn parent(&self) -> Option<ModuleName> {
        if self.is_top_level() {
            return None;
        }
        Some(ModuleName {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The name extended by one submodule segment.
    pub fn child(&self, segment: &str) -> ModuleName {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        ModuleName { segments }
    }

    /// Every prefix of the name from shortest to the full name itself.
    /// Imports walk this order, so `a.b.c` loads `a`, then `a.b`, then
    /// `a.b.c`.
    pub fn prefixes(&self) -> impl Iterator<Item = ModuleName> + '_ {
        (1..=self.segments.len()).map(|end| ModuleName {
            segments: self.segments[..end].to_vec(),
        })
    }

    /// The dotted rendering, also the registry key.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Resolves `name` against `package` the way `importlib.import_module` does:
/// leading dots make the name relative, one dot anchoring at the package
/// itself and each further dot climbing one level.
pub fn resolve_name(name: &str, package: &str) -> Result<ModuleName, ImportError> {
    let rest = name.trim_start_matches('.');
    let dots = name.len() - rest.len();
    if dots == 0 {
        return ModuleName::parse(name);
    }
    resolve_relative(dots as u32, rest, package, name)
}

/// Resolves the target of a `from <dots><module> import ...` statement,
/// where the parser delivers the dot count separately. `module` is `None`
/// for pure-dot forms such as `from . import x`.
pub fn resolve_from(
    level: u32,
    module: Option<&str>,
    package: &str,
) -> Result<ModuleName, ImportError> {
    let rest = module.unwrap_or("");
    if level == 0 {
        return ModuleName::parse(rest);
    }
    let display = format!("{}{}", ".".repeat(level as usize), rest);
    resolve_relative(level, rest, package, &display)
}

/// Shared relative-resolution core. `display` is the original spelling,
/// used only in error values.
fn resolve_relative(
    dots: u32,
    rest: &str,
    package: &str,
    display: &str,
) -> Result<ModuleName, ImportError> {
    if package.is_empty() {
        return Err(ImportError::RelativeWithoutAnchor {
            name: display.to_string(),
        });
    }
    let anchor = ModuleName::parse(package)?;
    let climb = (dots - 1) as usize;
    if climb >= anchor.segments.len() {
        return Err(ImportError::BeyondTopLevel {
            name: display.to_string(),
            package: package.to_string(),
        });
    }
    let mut segments = anchor.segments[..anchor.segments.len() - climb].to_vec();
    if !rest.is_empty() {
        segments.extend(ModuleName::parse(rest)?.segments);
    }
    Ok(ModuleName { segments })
}

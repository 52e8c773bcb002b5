//! Static extraction of what a module body does at import time.
//!
//! Executing a module means running its import statements in order; nothing
//! else a body does can change which modules get loaded, with two
//! exceptions the extractor models structurally: `try`/`except` blocks that
//! would catch an ImportError make their imports optional, and
//! `if TYPE_CHECKING:` bodies never run. Conditions in general cannot be
//! evaluated statically, so both branches of other `if` statements
//! contribute their imports, as do loop and `with` bodies and class bodies
//! (which execute at definition time). Function bodies do not run at import
//! time and are skipped.

use crate::error::ImportError;
use rustpython_ast::{self as ast, Expr, Stmt, TextSize};
use rustpython_parser::{parse, Mode};
use std::collections::HashSet;
use std::path::Path;

/// One import-relevant step of a module body, in execution order.
#[derive(Debug, Clone)]
pub enum Directive {
    /// `import a.b` or `import a.b as x`. Always an absolute dotted name.
    Import { module: String, line: usize },
    /// `from <dots><module> import names`. `module` is `None` for pure-dot
    /// forms such as `from . import x`.
    From {
        level: u32,
        module: Option<String>,
        names: FromNames,
        line: usize,
    },
    /// A `try` statement. A missing-module failure in the body is swallowed
    /// when one of the handlers would catch an ImportError.
    Try {
        body: Vec<Directive>,
        catches_import_error: bool,
        handlers: Vec<Directive>,
        orelse: Vec<Directive>,
        finalbody: Vec<Directive>,
    },
}

/// Names requested by a `from` import.
#[derive(Debug, Clone)]
pub enum FromNames {
    /// `from m import *`: loads the module, binds nothing the model tracks.
    Star,
    /// Explicit source names. `as` aliases are dropped; the binding target
    /// does not matter for dependency discovery, the imported name does.
    Names(Vec<String>),
}

/// The statically extracted shape of one module source.
#[derive(Debug)]
pub struct SourceModule {
    /// Import directives the body would execute, in order.
    pub directives: Vec<Directive>,
    /// Names the body binds at module level.
    pub bound: HashSet<String>,
}

/// Parses `source` into its directives and bound names. `name` and `path`
/// only label parse failures.
pub fn parse_source(name: &str, path: &Path, source: &str) -> Result<SourceModule, ImportError> {
    let parsed =
        parse(source, Mode::Module, &path.to_string_lossy()).map_err(|err| ImportError::Parse {
            name: name.to_string(),
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let ast::Mod::Module(module) = parsed else {
        return Ok(SourceModule {
            directives: Vec::new(),
            bound: HashSet::new(),
        });
    };

    let index = LineIndex::new(source);
    let mut directives = Vec::new();
    for stmt in &module.body {
        extract_stmt(stmt, &index, &mut directives);
    }

    let mut bound = HashSet::new();
    for stmt in &module.body {
        collect_bound(stmt, &mut bound);
    }

    Ok(SourceModule { directives, bound })
}

fn extract_stmts(stmts: &[Stmt], index: &LineIndex, out: &mut Vec<Directive>) {
    for stmt in stmts {
        extract_stmt(stmt, index, out);
    }
}

fn extract_stmt(stmt: &Stmt, index: &LineIndex, out: &mut Vec<Directive>) {
    match stmt {
        Stmt::Import(node) => {
            let line = index.line_of(node.range.start());
            for alias in &node.names {
                out.push(Directive::Import {
                    module: alias.name.to_string(),
                    line,
                });
            }
        }
        Stmt::ImportFrom(node) => {
            // `from __future__ import ...` is a compiler directive, not a
            // real import.
            if let Some(module) = &node.module {
                if module == "__future__" {
                    return;
                }
            }
            let level = node.level.as_ref().map_or(0, |l| l.to_u32());
            let names = if node.names.iter().any(|alias| alias.name.as_str() == "*") {
                FromNames::Star
            } else {
                FromNames::Names(node.names.iter().map(|alias| alias.name.to_string()).collect())
            };
            out.push(Directive::From {
                level,
                module: node.module.as_ref().map(|m| m.to_string()),
                names,
                line: index.line_of(node.range.start()),
            });
        }
        Stmt::If(node) => {
            if !is_type_checking(&node.test) {
                extract_stmts(&node.body, index, out);
            }
            extract_stmts(&node.orelse, index, out);
        }
        Stmt::Try(node) => {
            out.push(build_try(
                &node.body,
                &node.handlers,
                &node.orelse,
                &node.finalbody,
                index,
            ));
        }
        Stmt::TryStar(node) => {
            out.push(build_try(
                &node.body,
                &node.handlers,
                &node.orelse,
                &node.finalbody,
                index,
            ));
        }
        Stmt::For(node) => {
            extract_stmts(&node.body, index, out);
            extract_stmts(&node.orelse, index, out);
        }
        Stmt::AsyncFor(node) => {
            extract_stmts(&node.body, index, out);
            extract_stmts(&node.orelse, index, out);
        }
        Stmt::While(node) => {
            extract_stmts(&node.body, index, out);
            extract_stmts(&node.orelse, index, out);
        }
        Stmt::With(node) => {
            extract_stmts(&node.body, index, out);
        }
        Stmt::AsyncWith(node) => {
            extract_stmts(&node.body, index, out);
        }
        // Class bodies execute when the class statement does.
        Stmt::ClassDef(node) => {
            extract_stmts(&node.body, index, out);
        }
        _ => {}
    }
}

fn build_try(
    body: &[Stmt],
    handlers: &[ast::ExceptHandler],
    orelse: &[Stmt],
    finalbody: &[Stmt],
    index: &LineIndex,
) -> Directive {
    let catches_import_error = handlers.iter().any(handler_catches_import_error);

    let mut body_directives = Vec::new();
    extract_stmts(body, index, &mut body_directives);

    let mut handler_directives = Vec::new();
    for handler in handlers {
        let ast::ExceptHandler::ExceptHandler(node) = handler;
        extract_stmts(&node.body, index, &mut handler_directives);
    }

    let mut orelse_directives = Vec::new();
    extract_stmts(orelse, index, &mut orelse_directives);

    let mut final_directives = Vec::new();
    extract_stmts(finalbody, index, &mut final_directives);

    Directive::Try {
        body: body_directives,
        catches_import_error,
        handlers: handler_directives,
        orelse: orelse_directives,
        finalbody: final_directives,
    }
}

fn handler_catches_import_error(handler: &ast::ExceptHandler) -> bool {
    let ast::ExceptHandler::ExceptHandler(node) = handler;
    match &node.type_ {
        // A bare `except:` catches everything.
        None => true,
        Some(expr) => names_import_error(expr),
    }
}

fn names_import_error(expr: &Expr) -> bool {
    match expr {
        Expr::Name(node) => matches!(
            node.id.as_str(),
            "ImportError" | "ModuleNotFoundError" | "Exception" | "BaseException"
        ),
        Expr::Attribute(node) => matches!(
            node.attr.as_str(),
            "ImportError" | "ModuleNotFoundError" | "Exception" | "BaseException"
        ),
        Expr::Tuple(node) => node.elts.iter().any(names_import_error),
        _ => false,
    }
}

fn is_type_checking(test: &Expr) -> bool {
    match test {
        Expr::Name(node) => node.id.as_str() == "TYPE_CHECKING",
        Expr::Attribute(node) => node.attr.as_str() == "TYPE_CHECKING",
        _ => false,
    }
}

fn collect_bound(stmt: &Stmt, bound: &mut HashSet<String>) {
    match stmt {
        Stmt::FunctionDef(node) => {
            bound.insert(node.name.to_string());
        }
        Stmt::AsyncFunctionDef(node) => {
            bound.insert(node.name.to_string());
        }
        Stmt::ClassDef(node) => {
            bound.insert(node.name.to_string());
        }
        Stmt::Assign(node) => {
            for target in &node.targets {
                collect_target(target, bound);
            }
        }
        Stmt::AnnAssign(node) => collect_target(&node.target, bound),
        Stmt::AugAssign(node) => collect_target(&node.target, bound),
        Stmt::Import(node) => {
            for alias in &node.names {
                match &alias.asname {
                    Some(asname) => {
                        bound.insert(asname.to_string());
                    }
                    // `import a.b` binds the top-level `a`.
                    None => {
                        let top = alias
                            .name
                            .as_str()
                            .split('.')
                            .next()
                            .unwrap_or(alias.name.as_str());
                        bound.insert(top.to_string());
                    }
                }
            }
        }
        Stmt::ImportFrom(node) => {
            for alias in &node.names {
                let target = alias.asname.as_ref().unwrap_or(&alias.name);
                if target.as_str() != "*" {
                    bound.insert(target.to_string());
                }
            }
        }
        Stmt::If(node) => {
            for stmt in node.body.iter().chain(&node.orelse) {
                collect_bound(stmt, bound);
            }
        }
        Stmt::For(node) => {
            collect_target(&node.target, bound);
            for stmt in node.body.iter().chain(&node.orelse) {
                collect_bound(stmt, bound);
            }
        }
        Stmt::AsyncFor(node) => {
            collect_target(&node.target, bound);
            for stmt in node.body.iter().chain(&node.orelse) {
                collect_bound(stmt, bound);
            }
        }
        Stmt::While(node) => {
            for stmt in node.body.iter().chain(&node.orelse) {
                collect_bound(stmt, bound);
            }
        }
        Stmt::With(node) => {
            for item in &node.items {
                if let Some(vars) = &item.optional_vars {
                    collect_target(vars, bound);
                }
            }
            for stmt in &node.body {
                collect_bound(stmt, bound);
            }
        }
        Stmt::AsyncWith(node) => {
            for item in &node.items {
                if let Some(vars) = &item.optional_vars {
                    collect_target(vars, bound);
                }
            }
            for stmt in &node.body {
                collect_bound(stmt, bound);
            }
        }
        Stmt::Try(node) => {
            for stmt in &node.body {
                collect_bound(stmt, bound);
            }
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler_node) = handler;
                for stmt in &handler_node.body {
                    collect_bound(stmt, bound);
                }
            }
            for stmt in node.orelse.iter().chain(&node.finalbody) {
                collect_bound(stmt, bound);
            }
        }
        Stmt::TryStar(node) => {
            for stmt in &node.body {
                collect_bound(stmt, bound);
            }
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler_node) = handler;
                for stmt in &handler_node.body {
                    collect_bound(stmt, bound);
                }
            }
            for stmt in node.orelse.iter().chain(&node.finalbody) {
                collect_bound(stmt, bound);
            }
        }
        _ => {}
    }
}

fn collect_target(expr: &Expr, bound: &mut HashSet<String>) {
    match expr {
        Expr::Name(node) => {
            bound.insert(node.id.to_string());
        }
        Expr::Tuple(node) => {
            for elt in &node.elts {
                collect_target(elt, bound);
            }
        }
        Expr::List(node) => {
            for elt in &node.elts {
                collect_target(elt, bound);
            }
        }
        Expr::Starred(node) => collect_target(&node.value, bound),
        // Attribute and subscript targets bind no new module-level name.
        _ => {}
    }
}

/// Maps parser byte offsets to 1-indexed line numbers.
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    fn line_of(&self, offset: TextSize) -> usize {
        let offset = offset.to_usize();
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }
}

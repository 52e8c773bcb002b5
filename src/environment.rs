//! The modelled environment a probe runs against.
//!
//! Two things define it: the ordered filesystem roots searched for source
//! modules, and the set of top-level names considered installed. Installed
//! names resolve without touching the filesystem and are treated as
//! attribute-complete, so `from os import path` or `import os.path` never
//! fails. The default installed set is the standard library index;
//! third-party packages must be added explicitly.

use lazy_static::lazy_static;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Top-level names of the CPython standard library.
const STDLIB_MODULES: &[&str] = &[
    "abc", "aifc", "argparse", "array", "ast", "asynchat", "asyncio", "asyncore", "atexit",
    "audioop", "base64", "bdb", "binascii", "bisect", "builtins", "bz2", "calendar", "cgi",
    "cgitb", "chunk", "cmath", "cmd", "code", "codecs", "codeop", "collections", "colorsys",
    "compileall", "concurrent", "configparser", "contextlib", "contextvars", "copy", "copyreg",
    "cProfile", "crypt", "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal",
    "difflib", "dis", "distutils", "doctest", "email", "encodings", "enum", "errno",
    "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch", "fractions", "ftplib",
    "functools", "gc", "getopt", "getpass", "gettext", "glob", "graphlib", "grp", "gzip",
    "hashlib", "heapq", "hmac", "html", "http", "imaplib", "imghdr", "importlib", "inspect",
    "io", "ipaddress", "itertools", "json", "keyword", "linecache", "locale", "logging", "lzma",
    "mailbox", "mailcap", "marshal", "math", "mimetypes", "mmap", "modulefinder",
    "multiprocessing", "netrc", "nntplib", "numbers", "operator", "optparse", "os", "pathlib",
    "pdb", "pickle", "pickletools", "pipes", "pkgutil", "platform", "plistlib", "poplib",
    "posix", "pprint", "profile", "pstats", "pty", "pwd", "pyclbr", "pydoc", "queue", "quopri",
    "random", "re", "readline", "reprlib", "resource", "rlcompleter", "runpy", "sched",
    "secrets", "select", "selectors", "shelve", "shlex", "shutil", "signal", "site", "smtpd",
    "smtplib", "sndhdr", "socket", "socketserver", "sqlite3", "ssl", "stat", "statistics",
    "string", "stringprep", "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig",
    "syslog", "tabnanny", "tarfile", "telnetlib", "tempfile", "termios", "textwrap",
    "threading", "time", "timeit", "tkinter", "token", "tokenize", "tomllib", "trace",
    "traceback", "tracemalloc", "tty", "turtle", "types", "typing", "unicodedata", "unittest",
    "urllib", "uu", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser", "winreg",
    "winsound", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib",
    "zoneinfo",
];

lazy_static! {
    static ref DEFAULT_INSTALLED: BTreeSet<String> =
        STDLIB_MODULES.iter().map(|name| name.to_string()).collect();
}

/// A resolved module file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub is_package: bool,
}

/// Probes `dir` for the module `name`: a package directory carrying an
/// `__init__.py` wins over a plain `name.py` file.
pub fn locate_in(dir: &Path, name: &str) -> Option<SourceLocation> {
    let init = dir.join(name).join("__init__.py");
    if init.is_file() {
        return Some(SourceLocation {
            path: init,
            is_package: true,
        });
    }
    let file = dir.join(format!("{name}.py"));
    if file.is_file() {
        return Some(SourceLocation {
            path: file,
            is_package: false,
        });
    }
    None
}

#[derive(Debug, Clone)]
pub struct Environment {
    roots: Vec<PathBuf>,
    installed: BTreeSet<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            installed: DEFAULT_INSTALLED.clone(),
        }
    }
}

impl Environment {
    /// The default environment: no roots, standard library installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment with nothing installed at all.
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            installed: BTreeSet::new(),
        }
    }

    /// Appends a search root. Earlier roots win.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.add_root(root);
        self
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Declares a top-level name installed.
    pub fn with_installed(mut self, name: &str) -> Self {
        self.add_installed(name);
        self
    }

    pub fn add_installed(&mut self, name: &str) {
        self.installed.insert(name.to_string());
    }

    pub fn remove_installed(&mut self, name: &str) {
        self.installed.remove(name);
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_installed(&self, top_level: &str) -> bool {
        self.installed.contains(top_level)
    }

    pub fn installed(&self) -> impl Iterator<Item = &str> {
        self.installed.iter().map(String::as_str)
    }

    /// Locates a top-level source module, trying the roots in order.
    pub fn locate_top_level(&self, name: &str) -> Option<SourceLocation> {
        self.roots.iter().find_map(|root| locate_in(root, name))
    }
}

use mockmod::environment::Environment;
use mockmod::error::ImportError;
use mockmod::prober::{find_imports, Prober};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(&path).unwrap();
    write!(file, "{}", content).unwrap();
}

/// A small project whose package init and submodule both pull in modules
/// that do not exist anywhere, mixed with stdlib imports that do.
fn dummy_project(root: &Path) {
    let init = r#"
import non_existent_inner_package
import non_existent_inner_module
"#;
    write_file(root, "tests/__init__.py", init);

    let dummy = r#"
import itertools
import non_existent_module
from non_existent_package import anything
import a_non_existent_package.submodule
from b_non_existent_package.submodule import thing
from functools import wraps
"#;
    write_file(root, "tests/dummy.py", dummy);
}

#[test]
fn test_not_found_modules() {
    let dir = tempdir().unwrap();
    dummy_project(dir.path());

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports(".dummy", "tests").unwrap();

    // The package init fails first, so its two names lead. Dotted imports
    // report only their first missing prefix.
    let expected = [
        "non_existent_inner_package",
        "non_existent_inner_module",
        "non_existent_module",
        "non_existent_package",
        "a_non_existent_package",
        "b_non_existent_package",
    ];
    assert_eq!(observed, expected);
}

#[test]
fn test_find_modules_not_listed() {
    let dir = tempdir().unwrap();
    dummy_project(dir.path());

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports(".dummy", "tests").unwrap();

    assert!(!observed.iter().any(|name| name == "itertools"));
    assert!(!observed.iter().any(|name| name == "functools"));
}

#[test]
fn test_multiple_calls_same_return() {
    let dir = tempdir().unwrap();
    dummy_project(dir.path());

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let first = prober.find_imports(".dummy", "tests").unwrap();
    let second = prober.find_imports(".dummy", "tests").unwrap();

    // Cleanup evicts the package itself along with the mocks, so the init
    // re-runs and the second call repeats the full list, inner names
    // included.
    assert_eq!(first, second);
    assert!(first.iter().any(|name| name == "non_existent_inner_package"));
}

#[test]
fn test_find_not_installed_modules() {
    let observed = find_imports("pandas", "").unwrap();
    assert_eq!(observed, vec!["pandas"]);
}

#[test]
fn test_registry_is_left_empty() {
    let dir = tempdir().unwrap();
    dummy_project(dir.path());

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    prober.find_imports(".dummy", "tests").unwrap();

    assert!(prober.importer().registry().is_empty());
}

#[test]
fn test_missing_anchor_package_is_reported() {
    // No files at all: the anchor itself is the first and only miss; the
    // submodule then resolves as a mock child of the mocked anchor.
    let dir = tempdir().unwrap();

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports(".dummy", "tests").unwrap();

    assert_eq!(observed, vec!["tests"]);
}

#[test]
fn test_from_import_misses_are_reported_dotted() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "pkg/__init__.py", "");
    write_file(dir.path(), "main.py", "from pkg import missing_thing\n");

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports("main", "").unwrap();

    assert_eq!(observed, vec!["pkg.missing_thing"]);
}

#[test]
fn test_plain_module_from_import_misses_terminate() {
    // `helper` exists but binds no such name. The dotted stand-in from
    // the first attempt has to satisfy the retry, or the loop would
    // report the same name forever.
    let dir = tempdir().unwrap();
    write_file(dir.path(), "helper.py", "VALUE = 1\n");
    write_file(dir.path(), "main.py", "from helper import nothing\n");

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports("main", "").unwrap();

    assert_eq!(observed, vec!["helper.nothing"]);
}

#[test]
fn test_init_importing_a_missing_sibling_is_reported() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "pkg/__init__.py", "from . import ghost\n");

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports("pkg", "").unwrap();

    assert_eq!(observed, vec!["pkg.ghost"]);
    assert!(prober.importer().registry().is_empty());
}

#[test]
fn test_guarded_imports_are_not_reported() {
    let dir = tempdir().unwrap();
    let content = r#"
try:
    import fancy_accelerator
except ImportError:
    fancy_accelerator = None
"#;
    write_file(dir.path(), "main.py", content);

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports("main", "").unwrap();

    assert!(observed.is_empty());
}

#[test]
fn test_transitive_misses_are_collected() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "app.py", "import app_config\nimport missing_http\n");
    write_file(dir.path(), "app_config.py", "import missing_yaml\n");

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let observed = prober.find_imports("app", "").unwrap();

    assert_eq!(observed, vec!["missing_yaml", "missing_http"]);
}

#[test]
fn test_syntax_errors_are_fatal() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "broken.py", "def oops(:\n");

    let mut prober = Prober::new(Environment::default().with_root(dir.path()));
    let err = prober.find_imports("broken", "").unwrap_err();

    assert!(matches!(err, ImportError::Parse { .. }));
    assert!(prober.importer().registry().is_empty());
}

#[test]
fn test_relative_name_requires_an_anchor() {
    let err = find_imports(".dummy", "").unwrap_err();
    assert!(matches!(err, ImportError::RelativeWithoutAnchor { .. }));
}

use anyhow::Result;
use clap::Parser;
use colored::*;
use mockmod::environment::Environment;
use mockmod::prober::Prober;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dotted name of the module to probe.
    /// May start with dots for a relative name, in which case --package
    /// must name the anchor package.
    module: String,

    /// Anchor package for relative module names.
    #[arg(short, long, default_value = "")]
    package: String,

    /// Directory to search for Python source files. May be repeated;
    /// earlier roots win.
    #[arg(short, long)]
    root: Vec<PathBuf>,

    /// Extra top-level module name to treat as installed. May be repeated.
    #[arg(short, long)]
    installed: Vec<String>,

    /// Start from an empty installed set instead of the bundled standard
    /// library names.
    #[arg(long)]
    no_default_installed: bool,

    /// Output raw JSON.
    /// If true, the output will be in JSON format for machine parsing.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

/// Probe outcome in the shape the --json flag prints.
#[derive(Serialize)]
struct ProbeReport {
    module: String,
    package: String,
    missing: Vec<String>,
}

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("mockmod=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mockmod=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// Main entry point of the application.
///
/// This function handles argument parsing, environment setup, the probe
/// itself, and output formatting.
fn main() -> Result<()> {
    // Parse command line arguments using the Cli struct definition.
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("starting with args: {:?}", cli);

    // Build the environment the probe runs against. The default carries
    // the bundled standard library names; --no-default-installed starts
    // from nothing so even `os` would count as missing.
    let mut env = if cli.no_default_installed {
        Environment::empty()
    } else {
        Environment::default()
    };
    for root in &cli.root {
        env.add_root(root.clone());
    }
    for name in &cli.installed {
        env.add_installed(name);
    }

    // Run the probe. This repeatedly attempts the import, mocking each
    // missing module, until the import runs to completion.
    let mut prober = Prober::new(env);
    let missing = prober.find_imports(&cli.module, &cli.package)?;

    // Check if JSON output was requested.
    if cli.json {
        // Serialize the report to a pretty-printed JSON string.
        // This is useful for integrating with other tools or pipelines.
        let report = ProbeReport {
            module: cli.module,
            package: cli.package,
            missing,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        // If not JSON, print a human-readable report.
        println!("\n{}", "Missing Import Scan".bold());
        println!("===================\n");

        println!("Probed module: {}", cli.module);
        if missing.is_empty() {
            println!("{}", "All imports satisfied.".green());
        } else {
            println!("Missing modules: {}\n", missing.len());
            for (i, name) in missing.iter().enumerate() {
                println!(" {}. {}", i + 1, name.red());
            }
        }
    }

    // Return Ok(()) to indicate successful execution.
    Ok(())
}
